//! The mock admin dashboard. The login is a session flag, not a security boundary,
//! and the numbers are fixed.

use super::prelude::*;
use super::session::{is_admin_logged_in, set_admin_logged_in};
use super::views::navigate;

#[derive(Clone, Debug)]
pub(crate) struct ActivityRecord {
    pub(crate) name: &'static str,
    pub(crate) years: &'static str,
    pub(crate) date: &'static str,
}

const TOTAL_GENERATIONS: u32 = 1337;
const UNIQUE_USERS: u32 = 428;

const RECENT_ACTIVITY: [ActivityRecord; 4] = [
    ActivityRecord {
        name: "Alex",
        years: "1995 - 2024",
        date: "2024-07-21 10:34 AM",
    },
    ActivityRecord {
        name: "Jordan",
        years: "2001 - 2023",
        date: "2024-07-21 10:31 AM",
    },
    ActivityRecord {
        name: "Casey",
        years: "1989 - 2024",
        date: "2024-07-21 09:55 AM",
    },
    ActivityRecord {
        name: "Sam",
        years: "1998 - 2022",
        date: "2024-07-20 08:12 PM",
    },
];

#[derive(Template, WebTemplate)]
#[template(path = "admin_login.html")]
pub(crate) struct AdminLoginTemplate {
    csrf_token: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub(crate) struct AdminTemplate {
    total_generations: u32,
    unique_users: u32,
    recent_activity: Vec<ActivityRecord>,
}

#[derive(Deserialize)]
pub(crate) struct AdminLoginForm {
    csrf_token: String,
}

pub(crate) async fn admin_view(session: &Session, csrf_token: String) -> Result<Response, ZiduError> {
    if !is_admin_logged_in(session).await? {
        return Ok(AdminLoginTemplate { csrf_token }.into_response());
    }
    Ok(AdminTemplate {
        total_generations: TOTAL_GENERATIONS,
        unique_users: UNIQUE_USERS,
        recent_activity: RECENT_ACTIVITY.to_vec(),
    }
    .into_response())
}

/// The footer link.
pub(crate) async fn open_admin_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, ZiduError> {
    navigate(&state, &session, ViewEvent::OpenAdmin).await?;
    Ok(Redirect::to("/"))
}

/// Accepts any credentials.
#[instrument(skip_all)]
pub(crate) async fn admin_login_handler(
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Result<Redirect, ZiduError> {
    validate_csrf(&session, &form.csrf_token).await?;
    set_admin_logged_in(&session).await?;
    info!("Mock admin login");
    Ok(Redirect::to("/"))
}
