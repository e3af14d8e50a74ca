//! Client for the Gemini `generateContent` endpoint.
//!
//! One request carries the childhood photo, the current photo and the prompt,
//! in that order, and asks for an image-only response.
//! Docs: <https://ai.google.dev/api/generate-content>

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::config::GeminiConfig;
use crate::constants::GEMINI_API_KEY_HEADER;
use crate::encoder::encode;
use crate::error::ZiduError;
use crate::generation::{GeneratedImage, GenerationRequest, UploadedImage};
use crate::prompt::build_prompt;

// -----------------------------
// Request wire types
// -----------------------------

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum RequestPart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<Modality>,
}

#[derive(Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Modality {
    Image,
}

// -----------------------------
// Response wire types
// -----------------------------

/// Body of a `generateContent` response, reduced to what we read.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Picks the first inline image out of the first candidate.
///
/// Text and any other parts are skipped. No image part at all is a
/// [`ZiduError::Generation`]; finish and block reasons only go into its message.
pub fn extract_image(response: GenerateContentResponse) -> Result<GeneratedImage, ZiduError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ZiduError::Generation(match block_reason {
            Some(reason) => format!("no image produced: prompt blocked ({reason})"),
            None => "no image produced: response has no candidates".to_string(),
        }));
    };

    let finish_reason = candidate.finish_reason;
    let parts = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default();
    let text_parts = parts.iter().filter(|part| part.text.is_some()).count();

    parts
        .into_iter()
        .find_map(|part| part.inline_data)
        .map(|inline| GeneratedImage {
            mime_type: inline.mime_type,
            data: inline.data,
        })
        .ok_or_else(|| {
            ZiduError::Generation(format!(
                "no image produced (finish reason: {}, text parts: {text_parts})",
                finish_reason.as_deref().unwrap_or("unknown")
            ))
        })
}

/// Parses a raw response body, see [`extract_image`].
pub fn parse_response(body: &[u8]) -> Result<GeneratedImage, ZiduError> {
    let parsed: GenerateContentResponse = serde_json::from_slice(body).map_err(|err| {
        ZiduError::Generation(format!("Failed to parse generateContent JSON: {err}"))
    })?;
    extract_image(parsed)
}

async fn inline_part(image: &UploadedImage) -> Result<RequestPart<'static>, ZiduError> {
    let mime_type = image.mime_type()?;
    let data = encode(image.bytes()).await?;
    debug!(
        "Encoded {} photo ({mime_type}, {} bytes)",
        image.origin(),
        image.bytes().len()
    );
    Ok(RequestPart::InlineData {
        inline_data: InlineData { mime_type, data },
    })
}

/// Talks to Gemini on behalf of the web handlers.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: Url,
}

impl GeminiClient {
    /// Builds a client. A missing API key is not an error until [`Self::generate`] runs.
    pub fn new(config: &GeminiConfig) -> Result<Self, ZiduError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ZiduError::Configuration(err.to_string()))?;
        let endpoint = config
            .api_base
            .join(&format!("v1beta/models/{}:generateContent", config.model))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint,
        })
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The full `generateContent` URL this client posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Generates one composite image from the request's two photos.
    #[instrument(skip_all, fields(name = %request.subject_name))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, ZiduError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ZiduError::Configuration(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        };

        let childhood = inline_part(&request.childhood_image).await?;
        let current = inline_part(&request.current_image).await?;
        let prompt = build_prompt(
            &request.subject_name,
            &request.childhood_year,
            &request.current_year,
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![childhood, current, RequestPart::Text { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec![Modality::Image],
            },
        };

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(GEMINI_API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ZiduError::Generation(format!("Request to Gemini failed: {err}")))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| ZiduError::Generation(format!("Failed reading Gemini body: {err}")))?;

        if !status.is_success() {
            let detail = match serde_json::from_slice::<ApiErrorEnvelope>(&bytes) {
                Ok(envelope) => format!(
                    "{} {}",
                    envelope.error.status.unwrap_or_default(),
                    envelope.error.message
                ),
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            return Err(ZiduError::Generation(format!(
                "Gemini API error {status}: {}",
                detail.trim()
            )));
        }

        let image = parse_response(&bytes)?;
        debug!(
            "Gemini returned {} ({} base64 chars)",
            image.mime_type,
            image.data.len()
        );
        Ok(image)
    }
}
