pub(crate) use super::csrf::{csrf_token, validate_csrf};
pub(crate) use super::session::{current_view, store_view, stored_view, visitor_token};
pub(crate) use crate::constants::LOADER_MESSAGES;
pub(crate) use crate::error::ZiduError;
pub(crate) use crate::view::{ViewEvent, ViewState};
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, State};
pub(crate) use axum::response::{IntoResponse, Redirect, Response};
pub(crate) use serde::Deserialize;
pub(crate) use tower_sessions::Session;
pub(crate) use tracing::{error, info, instrument};
