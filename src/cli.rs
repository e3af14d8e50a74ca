//! CLI parser
use clap::Parser;
use std::num::{NonZeroU16, NonZeroUsize};
use std::path::PathBuf;
use url::Url;

use crate::constants::{DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL, DEFAULT_SESSION_CAPACITY};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "ZIDU_DEBUG")]
    /// Enable debug logging. Env: ZIDU_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "ZIDU_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: ZIDU_PORT
    pub port: NonZeroU16,
    #[clap(long, short, default_value = "127.0.0.1", env = "ZIDU_LISTEN_ADDRESS")]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: ZIDU_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    /// Gemini API key. The site still serves pages without one, but every
    /// generation attempt fails until it is set.
    /// Env: GEMINI_API_KEY
    pub gemini_api_key: Option<String>,

    #[clap(long, default_value = DEFAULT_GEMINI_MODEL, env = "ZIDU_GEMINI_MODEL")]
    /// Image model used for generation.
    /// Env: ZIDU_GEMINI_MODEL
    pub gemini_model: String,

    #[clap(long, default_value = DEFAULT_GEMINI_API_BASE, env = "ZIDU_GEMINI_API_BASE")]
    /// Base URL of the Gemini REST API.
    /// Env: ZIDU_GEMINI_API_BASE
    pub gemini_api_base: Url,

    #[clap(long, default_value = "120", env = "ZIDU_REQUEST_TIMEOUT")]
    /// Timeout (in seconds) for a single generation call.
    /// Env: ZIDU_REQUEST_TIMEOUT
    pub request_timeout: u64,

    #[clap(long, env = "ZIDU_STATIC_DIR")]
    /// Directory holding `styles.css` and `site.js`, defaults to the `static`
    /// directory next to the crate manifest.
    /// Env: ZIDU_STATIC_DIR
    pub static_dir: Option<PathBuf>,

    #[clap(long, default_value = DEFAULT_SESSION_CAPACITY, env = "ZIDU_SESSION_CAPACITY")]
    /// Max visitor sessions held in memory. Once full, the least recently
    /// active session is dropped.
    /// Env: ZIDU_SESSION_CAPACITY
    pub session_capacity: NonZeroUsize,
}
