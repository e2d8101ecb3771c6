use clap::Parser;
use env_logger::Env;

use tiktok_downloader_lib::config::Config;
use tiktok_downloader_lib::http_server::start_api_server;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!("[Server] Starting tiktok-downloader {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = start_api_server(config).await {
        log::error!("[Server] {}", e);
        std::process::exit(1);
    }
}
