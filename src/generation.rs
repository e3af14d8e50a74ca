//! Request and result types for one memory generation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::ACCEPTED_IMAGE_TYPES;
use crate::encoder::to_data_url;
use crate::error::ZiduError;

/// Which of the two photos an upload is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageOrigin {
    /// The childhood photo, sent first.
    Childhood,
    /// The current photo, sent second. Background and lighting come from it.
    Current,
}

impl std::fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Childhood => write!(f, "childhood"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// A photo as received from the upload form.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    declared_mime: Option<String>,
    origin: ImageOrigin,
}

impl UploadedImage {
    /// Wraps uploaded bytes along with the MIME type the browser declared, if any.
    pub fn new(bytes: Vec<u8>, declared_mime: Option<String>, origin: ImageOrigin) -> Self {
        Self {
            bytes,
            declared_mime,
            origin,
        }
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Which photo this is.
    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    /// Works out the MIME type to send upstream.
    ///
    /// The bytes must sniff as PNG, JPEG or WebP, and the sniffed type is what
    /// gets sent. The declared type only matters for a log line when the two
    /// disagree, as with a PNG saved as `photo.jpg`.
    pub fn mime_type(&self) -> Result<String, ZiduError> {
        let format = image::guess_format(&self.bytes).map_err(|err| {
            ZiduError::Read(format!("{} photo is not a readable image: {err}", self.origin))
        })?;
        let sniffed = format.to_mime_type();
        if !ACCEPTED_IMAGE_TYPES.contains(&sniffed) {
            return Err(ZiduError::Read(format!(
                "{} photo has unsupported type {sniffed}",
                self.origin
            )));
        }
        if let Some(declared) = self.declared_mime.as_deref().map(str::trim)
            && declared.starts_with("image/")
            && declared != sniffed
        {
            debug!(
                "{} photo declared as {declared} but contains {sniffed}",
                self.origin
            );
        }
        Ok(sniffed.to_string())
    }
}

/// The home form as submitted, possibly incomplete.
#[derive(Clone, Debug, Default)]
pub struct GenerationForm {
    /// Person's name.
    pub name: String,
    /// Year of the childhood photo.
    pub childhood_year: String,
    /// Year of the current photo.
    pub current_year: String,
    /// Childhood photo, if one was picked.
    pub childhood_image: Option<UploadedImage>,
    /// Current photo, if one was picked.
    pub current_image: Option<UploadedImage>,
}

impl GenerationForm {
    /// True when all five fields are filled in.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.childhood_year.trim().is_empty()
            && !self.current_year.trim().is_empty()
            && self
                .childhood_image
                .as_ref()
                .is_some_and(|image| !image.bytes.is_empty())
            && self
                .current_image
                .as_ref()
                .is_some_and(|image| !image.bytes.is_empty())
    }

    /// Submission is allowed only for a complete form with nothing in flight.
    pub fn can_submit(&self, loading: bool) -> bool {
        self.is_complete() && !loading
    }

    /// Converts a complete form into a request, `None` otherwise.
    pub fn into_request(self) -> Option<GenerationRequest> {
        if !self.is_complete() {
            return None;
        }
        Some(GenerationRequest {
            subject_name: self.name.trim().to_string(),
            childhood_year: self.childhood_year.trim().to_string(),
            current_year: self.current_year.trim().to_string(),
            childhood_image: self.childhood_image?,
            current_image: self.current_image?,
        })
    }
}

/// Everything needed for one generation call.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Person's name, rendered into the image.
    pub subject_name: String,
    /// Year of the childhood photo.
    pub childhood_year: String,
    /// Year of the current photo.
    pub current_year: String,
    /// Childhood photo.
    pub childhood_image: UploadedImage,
    /// Current photo.
    pub current_image: UploadedImage,
}

/// The one image a successful generation returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// MIME type declared by the API.
    pub mime_type: String,
    /// Base64 image payload.
    pub data: String,
}

impl GeneratedImage {
    /// The image as a `data:` URL, usable directly as an `<img>` source.
    pub fn data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.data)
    }
}
