use rand::distr::{Alphanumeric, Distribution};
use tower_sessions::Session;

use crate::error::ZiduError;

const CSRF_TOKEN_KEY: &str = "csrf_token";

pub(crate) fn generate_token() -> String {
    Alphanumeric
        .sample_iter(rand::rng())
        .take(32)
        .map(char::from)
        .collect()
}

/// Returns the session's CSRF token, minting one on first use.
pub(crate) async fn csrf_token(session: &Session) -> Result<String, ZiduError> {
    if let Some(existing) = session.get::<String>(CSRF_TOKEN_KEY).await? {
        return Ok(existing);
    }
    let token = generate_token();
    session.insert(CSRF_TOKEN_KEY, token.clone()).await?;
    Ok(token)
}

pub(crate) async fn validate_csrf(session: &Session, token: &str) -> Result<(), ZiduError> {
    let stored = session.get::<String>(CSRF_TOKEN_KEY).await?;
    match stored {
        Some(expected) if expected == token => Ok(()),
        _ => Err(ZiduError::Unauthorized),
    }
}
