//! Turns uploaded image bytes into base64 payloads for the Gemini API.

use base64::Engine;
use base64::engine::general_purpose;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ZiduError;

/// Reads `reader` to the end and returns its contents as standard, padded base64.
pub async fn encode<R>(mut reader: R) -> Result<String, ZiduError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(|err| ZiduError::Read(format!("Failed to read image: {err}")))?;
    Ok(general_purpose::STANDARD.encode(&bytes))
}

/// Builds a `data:` URL from a MIME type and a base64 payload.
pub fn to_data_url(mime_type: &str, base64_data: &str) -> String {
    format!("data:{mime_type};base64,{base64_data}")
}
