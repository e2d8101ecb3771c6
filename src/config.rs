// Server configuration from command-line flags and environment

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::downloader::backends::BridgeConfig;
use crate::downloader::proxy::ProxyConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "tiktok-downloader", version, about = "TikTok media resolver and download proxy")]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "TIKTOK_DL_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "TIKTOK_DL_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Interpreter used to run the extraction bridge
    #[arg(long, env = "TIKTOK_DL_NODE", default_value = "node")]
    pub node: String,

    #[arg(long, env = "TIKTOK_DL_BRIDGE", default_value = "bridge/tiktok-bridge.mjs")]
    pub bridge_script: PathBuf,

    /// Seconds before an extraction call is abandoned
    #[arg(long, env = "TIKTOK_DL_EXTRACT_TIMEOUT")]
    pub extract_timeout: Option<u64>,

    /// Outbound HTTP or SOCKS5 proxy
    #[arg(long, env = "TIKTOK_DL_PROXY")]
    pub proxy: Option<String>,

    /// Front-end assets served for unmatched paths
    #[arg(long, env = "TIKTOK_DL_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::default()
            .with_node(self.node.clone())
            .with_script(self.bridge_script.clone())
            .with_timeout(self.extract_timeout)
            .with_proxy(self.proxy.clone())
    }

    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig::default().with_proxy(self.proxy.clone())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["tiktok-downloader"]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:3000");
        assert_eq!(config.bridge_config().script, PathBuf::from("bridge/tiktok-bridge.mjs"));
        assert!(config.bridge_config().timeout_seconds.is_none());
    }

    #[test]
    fn test_flags_flow_into_backend_configs() {
        let config = Config::parse_from([
            "tiktok-downloader",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--extract-timeout",
            "45",
            "--proxy",
            "socks5://127.0.0.1:1080",
        ]);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.bridge_config().timeout_seconds, Some(45));
        assert_eq!(config.proxy_config().proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
    }

    #[test]
    fn test_bad_host_is_reported() {
        let config = Config::parse_from(["tiktok-downloader", "--host", "not a host"]);
        assert!(config.bind_addr().is_err());
    }
}
