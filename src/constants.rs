//! Shared constants/setters for things
//!

/// Brand string shown in the header and stamped on every generated image.
pub const BRAND: &str = "Zidu";

/// Default Gemini image model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";

/// Default Gemini REST API base, must end with a slash so endpoints join onto it.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/";

/// Header carrying the Gemini API key.
pub const GEMINI_API_KEY_HEADER: &str = "x-goog-api-key";

/// The only failure text a visitor ever sees.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate image. Please try again later.";

/// Filename offered by the result page's download link.
pub const DOWNLOAD_FILENAME: &str = "zidu_memory.png";

/// MIME types accepted for uploads.
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// Max size (in bytes) of a `/generate` request body, both photos included.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Idle lifetime (in seconds) of a visitor session.
pub const SESSION_INACTIVITY_SECONDS: i64 = 60 * 60;

/// Seconds between sweeps of expired sessions.
pub const SESSION_SWEEP_SECONDS: u64 = 60;

/// Default number of visitor sessions kept in memory.
pub const DEFAULT_SESSION_CAPACITY: &str = "256";

/// Seconds between refreshes of the loader page.
pub const LOADER_REFRESH_SECONDS: u64 = 3;

/// Rotating messages shown while a generation is running.
pub const LOADER_MESSAGES: [&str; 5] = [
    "Weaving the threads of time...",
    "Reuniting your past and present...",
    "Crafting your nostalgic moment...",
    "Painting your memory with AI...",
    "Asking the past to hug the present...",
];
