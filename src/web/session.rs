//! Per-visitor state kept in the session: the resting view, the visitor token
//! and the mock admin login flag.

use tower_sessions::Session;

use super::csrf::generate_token;
use super::in_flight::InFlight;
use crate::error::ZiduError;
use crate::view::ViewState;

const VIEW_KEY: &str = "view";
const VISITOR_KEY: &str = "visitor";
const ADMIN_LOGGED_IN_KEY: &str = "admin_logged_in";

pub(crate) async fn visitor_token(session: &Session) -> Result<String, ZiduError> {
    if let Some(existing) = session.get::<String>(VISITOR_KEY).await? {
        return Ok(existing);
    }
    let token = generate_token();
    session.insert(VISITOR_KEY, token.clone()).await?;
    Ok(token)
}

/// The view as last stored, never [`ViewState::Loading`].
pub(crate) async fn stored_view(session: &Session) -> Result<ViewState, ZiduError> {
    Ok(session.get::<ViewState>(VIEW_KEY).await?.unwrap_or_default())
}

pub(crate) async fn store_view(session: &Session, view: &ViewState) -> Result<(), ZiduError> {
    session.insert(VIEW_KEY, view).await?;
    Ok(())
}

/// The view to render right now: Loading while a generation runs, else the stored one.
pub(crate) async fn current_view(
    session: &Session,
    in_flight: &InFlight,
) -> Result<ViewState, ZiduError> {
    let visitor = visitor_token(session).await?;
    if in_flight.is_loading(&visitor) {
        return Ok(ViewState::Loading);
    }
    stored_view(session).await
}

pub(crate) async fn is_admin_logged_in(session: &Session) -> Result<bool, ZiduError> {
    Ok(session
        .get::<bool>(ADMIN_LOGGED_IN_KEY)
        .await?
        .unwrap_or(false))
}

pub(crate) async fn set_admin_logged_in(session: &Session) -> Result<(), ZiduError> {
    session.insert(ADMIN_LOGGED_IN_KEY, true).await?;
    Ok(())
}
