use std::process::ExitCode;

use clap::Parser;
use youtube_relay_lib::config::GatewayConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let config = GatewayConfig::parse();
    youtube_relay_lib::init_tracing();

    match youtube_relay_lib::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "gateway failed");
            eprintln!("youtube-relay: {}", e);
            ExitCode::FAILURE
        }
    }
}
