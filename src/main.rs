// src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

use greenroom::config::RelayConfig;

#[derive(Parser)]
#[command(name = "greenroom", version, about = "Chat-widget relay server for a show website")]
struct Cli {
    /// Bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        eprintln!("no .env file found, using process environment only");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    config.log_presence();
    tracing::info!(
        model = %config.gemini_model,
        guardrail = config.guardrail_enabled,
        window = config.popular_window,
        "starting relay"
    );

    greenroom::server::run(config).await
}
