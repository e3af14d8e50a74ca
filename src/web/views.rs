use super::admin::admin_view;
use super::prelude::*;
use super::upload::read_submission;
use crate::constants::{DOWNLOAD_FILENAME, GENERIC_FAILURE_MESSAGE, LOADER_REFRESH_SECONDS};
use axum::extract::Multipart;

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub(crate) csrf_token: String,
    pub(crate) error: Option<String>,
    pub(crate) loader_messages: Vec<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "loading.html")]
pub(crate) struct LoadingTemplate {
    pub(crate) refresh_seconds: u64,
    pub(crate) loader_messages: Vec<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "result.html")]
pub(crate) struct ResultTemplate {
    pub(crate) image_url: String,
    pub(crate) download_filename: &'static str,
    pub(crate) csrf_token: String,
}

/// handles the / GET, rendering whichever view is active
pub(crate) async fn root_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, ZiduError> {
    let view = current_view(&session, &state.in_flight).await?;
    let csrf_token = csrf_token(&session).await?;

    let response = match view {
        ViewState::Home { error } => HomeTemplate {
            csrf_token,
            error,
            loader_messages: LOADER_MESSAGES.to_vec(),
        }
        .into_response(),
        ViewState::Loading => LoadingTemplate {
            refresh_seconds: LOADER_REFRESH_SECONDS,
            loader_messages: LOADER_MESSAGES.to_vec(),
        }
        .into_response(),
        ViewState::Result { image } => ResultTemplate {
            image_url: image.data_url(),
            download_filename: DOWNLOAD_FILENAME,
            csrf_token,
        }
        .into_response(),
        ViewState::Admin => admin_view(&session, csrf_token).await?,
    };
    Ok(response)
}

/// Applies a navigation event. Navigating away from a running generation
/// abandons it, so its outcome never lands in the session.
pub(crate) async fn navigate(
    state: &AppState,
    session: &Session,
    event: ViewEvent,
) -> Result<(), ZiduError> {
    let visitor = visitor_token(session).await?;
    let view = current_view(session, &state.in_flight).await?;
    if view.is_loading() && state.in_flight.abandon(&visitor) {
        info!("Visitor left a running generation");
    }
    let next = view
        .apply(event)
        .map_err(|err| ZiduError::InternalServerError(err.to_string()))?;
    store_view(session, &next).await
}

/// The logo link.
pub(crate) async fn navigate_home_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, ZiduError> {
    navigate(&state, &session, ViewEvent::NavigateHome).await?;
    Ok(Redirect::to("/"))
}

#[derive(Deserialize)]
pub(crate) struct CreateAnotherForm {
    csrf_token: String,
}

pub(crate) async fn create_another_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateAnotherForm>,
) -> Result<Redirect, ZiduError> {
    validate_csrf(&session, &form.csrf_token).await?;
    navigate(&state, &session, ViewEvent::CreateAnother).await?;
    Ok(Redirect::to("/"))
}

/// A submission that broke before reaching the model goes through Loading
/// straight to the generic failure, like a failed generation would.
async fn fail_submission(session: &Session) -> Result<(), ZiduError> {
    let failed = stored_view(session).await?.apply(ViewEvent::Submit).and_then(|loading| {
        loading.apply(ViewEvent::Failed(GENERIC_FAILURE_MESSAGE.to_string()))
    });
    match failed {
        Ok(view) => store_view(session, &view).await,
        Err(err) => {
            info!("Ignoring submission: {}", err);
            Ok(())
        }
    }
}

/// Takes the home form, runs one generation and lands on the result or back on
/// the form with the generic failure message.
#[instrument(skip_all)]
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Redirect, ZiduError> {
    let submission = read_submission(multipart).await?;
    validate_csrf(&session, &submission.csrf_token).await?;

    let visitor = visitor_token(&session).await?;
    let loading = state.in_flight.is_loading(&visitor);
    if let Some(err) = &submission.upload_error {
        error!("Failed to read uploaded photos: {}", err);
        if !loading {
            fail_submission(&session).await?;
        }
        return Ok(Redirect::to("/"));
    }
    if !submission.form.can_submit(loading) {
        if loading {
            info!("Ignoring submission while a generation is in flight");
            return Ok(Redirect::to("/"));
        }
        return Err(ZiduError::BadRequest);
    }
    let Some(guard) = state.in_flight.try_acquire(&visitor) else {
        info!("Ignoring submission while a generation is in flight");
        return Ok(Redirect::to("/"));
    };

    let loading_view = match stored_view(&session).await?.apply(ViewEvent::Submit) {
        Ok(view) => view,
        Err(err) => {
            info!("Ignoring submission: {}", err);
            return Ok(Redirect::to("/"));
        }
    };
    let request = submission
        .form
        .into_request()
        .ok_or(ZiduError::BadRequest)?;

    let outcome = state.gemini.generate(&request).await;
    if guard.is_abandoned() {
        info!("Dropping generation outcome, visitor navigated away");
        return Ok(Redirect::to("/"));
    }

    let event = match outcome {
        Ok(image) => {
            info!("Generated memory for {} ({})", request.subject_name, image.mime_type);
            ViewEvent::Succeeded(image)
        }
        Err(err) => {
            error!("Failed to generate memory: {}", err);
            ViewEvent::Failed(GENERIC_FAILURE_MESSAGE.to_string())
        }
    };
    let next = loading_view
        .apply(event)
        .map_err(|err| ZiduError::InternalServerError(err.to_string()))?;
    store_view(&session, &next).await?;
    drop(guard);
    Ok(Redirect::to("/"))
}
