use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod server;

use config::Args;

fn init_tracing(debug: bool) {
    let _ = tracing_log::LogTracer::init();
    // Error reports are emitted on the `telemetry` target.
    let default_level = if debug { "nafanya=debug,telemetry=debug" } else { "nafanya=info,telemetry=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.debug);
    info!("Nafanya starting. default_provider={}, max_tokens={}", args.default_provider, args.max_tokens);

    if let Err(e) = server::run_server(args).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}
