//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::CliOptions;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("tower_sessions", LevelFilter::Warn)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Settings for talking to the Gemini API.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key; `None` makes every generation fail with a configuration error.
    pub api_key: Option<String>,
    /// Model name, eg `gemini-2.5-flash-image`.
    pub model: String,
    /// REST API base URL.
    pub api_base: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Pulls the Gemini settings out of the parsed CLI options.
    pub fn from_cli(cli: &CliOptions) -> Self {
        Self {
            api_key: cli
                .gemini_api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            model: cli.gemini_model.clone(),
            api_base: cli.gemini_api_base.clone(),
            timeout: Duration::from_secs(cli.request_timeout),
        }
    }
}
