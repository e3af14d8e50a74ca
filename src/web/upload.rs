use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use tracing::debug;

use crate::error::ZiduError;
use crate::generation::{GenerationForm, ImageOrigin, UploadedImage};

/// The home form as posted, plus its CSRF token.
pub(crate) struct Submission {
    pub(crate) form: GenerationForm,
    pub(crate) csrf_token: String,
    /// Set when the body broke off after the CSRF token arrived, typically an
    /// upload over the size limit.
    pub(crate) upload_error: Option<String>,
}

fn bad_multipart(err: MultipartError) -> ZiduError {
    debug!("Failed to read multipart body: {}", err);
    ZiduError::BadRequest
}

async fn read_image(
    field: Field<'_>,
    origin: ImageOrigin,
) -> Result<Option<UploadedImage>, MultipartError> {
    let declared_mime = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;
    // browsers send an empty part when no file was picked
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedImage::new(bytes.to_vec(), declared_mime, origin)))
}

async fn read_field(
    field: Field<'_>,
    form: &mut GenerationForm,
    csrf_token: &mut Option<String>,
) -> Result<(), MultipartError> {
    let field_name = field.name().unwrap_or_default().to_string();
    match field_name.as_str() {
        "name" => form.name = field.text().await?,
        "childhood_year" => form.childhood_year = field.text().await?,
        "current_year" => form.current_year = field.text().await?,
        "childhood_image" => {
            form.childhood_image = read_image(field, ImageOrigin::Childhood).await?;
        }
        "current_image" => {
            form.current_image = read_image(field, ImageOrigin::Current).await?;
        }
        "csrf_token" => *csrf_token = Some(field.text().await?),
        _ => {}
    }
    Ok(())
}

/// Reads the home form.
///
/// A broken body is a bad request until the CSRF token has been read. After
/// that the failure is handed back in [`Submission::upload_error`] so it can be
/// shown on the form like any other failed generation.
pub(crate) async fn read_submission(mut multipart: Multipart) -> Result<Submission, ZiduError> {
    let mut form = GenerationForm::default();
    let mut csrf_token: Option<String> = None;
    let mut upload_error = None;

    loop {
        let outcome = match multipart.next_field().await {
            Ok(Some(field)) => read_field(field, &mut form, &mut csrf_token).await,
            Ok(None) => break,
            Err(err) => Err(err),
        };
        if let Err(err) = outcome {
            if csrf_token.is_none() {
                return Err(bad_multipart(err));
            }
            upload_error = Some(err.to_string());
            break;
        }
    }

    Ok(Submission {
        form,
        csrf_token: csrf_token.ok_or(ZiduError::BadRequest)?,
        upload_error,
    })
}
