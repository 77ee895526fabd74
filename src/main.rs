use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use legged_teleop_keyboard::config::Config;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Setup logging (set RUST_LOG=debug to see every published payload)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    if let Err(e) = legged_teleop_keyboard::runtime::run(config).await {
        eprintln!("Teleop error: {}", e);
        std::process::exit(1);
    }
}
