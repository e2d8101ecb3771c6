pub mod config;
pub mod downloader;
pub mod http_server;
