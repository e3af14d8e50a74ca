use clap::Parser;
use zidu::config::{GeminiConfig, setup_logging};
use zidu::gemini::GeminiClient;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = zidu::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let gemini = match GeminiClient::new(&GeminiConfig::from_cli(&cli)) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to set up the Gemini client: {}", err);
            return;
        }
    };

    let static_dir = cli
        .static_dir
        .clone()
        .unwrap_or_else(zidu::web::default_static_dir);

    if let Err(err) = zidu::web::setup_server(
        &cli.listen_address,
        cli.port,
        gemini,
        &static_dir,
        cli.session_capacity,
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
