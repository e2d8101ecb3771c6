// Bridge backend - runs the Node.js extraction library as a subprocess
//
// The bridge script prints exactly one JSON document on stdout: the library's
// `{status, message, result, totalPosts}` envelope.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::downloader::errors::DownloadError;
use crate::downloader::traits::{ApiResponse, ApiVersion, TiktokBackend};
use crate::downloader::utils::run_output_with_timeout;

/// Configuration for the bridge subprocess
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Interpreter used to run the script
    pub node: String,
    pub script: PathBuf,
    /// Per-call timeout in seconds; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,
    /// Outbound proxy handed to the library through `HTTPS_PROXY`
    pub proxy: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            script: PathBuf::from("bridge/tiktok-bridge.mjs"),
            timeout_seconds: None,
            proxy: None,
        }
    }
}

impl BridgeConfig {
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_timeout(mut self, seconds: Option<u64>) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

pub struct BridgeBackend {
    config: BridgeConfig,
}

impl BridgeBackend {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Check if the interpreter can be started
    pub async fn is_available(&self) -> bool {
        match run_output_with_timeout(&self.config.node, vec!["--version".to_string()], vec![], Some(10)).await {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    fn build_args(&self, command: &str, rest: &[&str]) -> Vec<String> {
        let mut args = vec![
            self.config.script.to_string_lossy().to_string(),
            command.to_string(),
        ];
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }

    fn build_env(&self) -> Vec<(String, String)> {
        match &self.config.proxy {
            Some(proxy) => vec![
                ("HTTPS_PROXY".to_string(), proxy.clone()),
                ("HTTP_PROXY".to_string(), proxy.clone()),
            ],
            None => Vec::new(),
        }
    }

    async fn call(&self, command: &str, rest: &[&str]) -> Result<ApiResponse, DownloadError> {
        let args = self.build_args(command, rest);
        log::debug!("[Bridge] {} {}", self.config.node, args.join(" "));

        let output = run_output_with_timeout(
            &self.config.node,
            args,
            self.build_env(),
            self.config.timeout_seconds,
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);

            // Prefer an envelope on stdout: the script reports library errors that way
            if let Ok(resp) = Self::parse_response(&output.stdout) {
                return Ok(resp);
            }

            let error_msg = if !stderr.trim().is_empty() {
                stderr.trim().to_string()
            } else if !stdout.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                format!("bridge exited with code: {:?}", output.status.code())
            };
            return Err(DownloadError::Execution(error_msg));
        }

        Self::parse_response(&output.stdout)
    }

    /// Parse the envelope, tolerating log noise before the JSON line
    fn parse_response(stdout: &[u8]) -> Result<ApiResponse, DownloadError> {
        let text = String::from_utf8_lossy(stdout);
        let trimmed = text.trim();

        if let Ok(resp) = serde_json::from_str::<ApiResponse>(trimmed) {
            return Ok(resp);
        }

        let last_line = trimmed.lines().last().unwrap_or("");
        serde_json::from_str::<ApiResponse>(last_line)
            .map_err(|e| DownloadError::Parse(format!("Invalid JSON from bridge: {}", e)))
    }
}

#[async_trait]
impl TiktokBackend for BridgeBackend {
    fn name(&self) -> &'static str {
        "node-bridge"
    }

    async fn download(&self, url: &str, version: ApiVersion) -> Result<ApiResponse, DownloadError> {
        self.call("download", &[url, version.as_str()]).await
    }

    async fn user_posts(&self, username: &str, post_limit: u32) -> Result<ApiResponse, DownloadError> {
        let limit = post_limit.to_string();
        self.call("user-posts", &[username, &limit]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::traits::ApiStatus;

    #[test]
    fn test_parse_plain_envelope() {
        let resp = BridgeBackend::parse_response(br#"{"status":"error","message":"nope"}"#).unwrap();
        assert_eq!(resp.status, ApiStatus::Error);
        assert_eq!(resp.message(), Some("nope"));
    }

    #[test]
    fn test_parse_skips_log_noise() {
        let out = b"warming up\nfetching page\n{\"status\":\"success\",\"result\":{\"desc\":\"hi\"}}\n";
        let resp = BridgeBackend::parse_response(out).unwrap();
        assert!(resp.is_success());
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        let err = BridgeBackend::parse_response(b"<html>").unwrap_err();
        assert!(matches!(err, DownloadError::Parse(_)));
    }

    #[test]
    fn test_args_and_env() {
        let backend = BridgeBackend::new(
            BridgeConfig::default()
                .with_script("/opt/bridge.mjs")
                .with_proxy(Some("socks5://127.0.0.1:1080".to_string())),
        );
        assert_eq!(
            backend.build_args("download", &["https://x", "v2"]),
            vec!["/opt/bridge.mjs", "download", "https://x", "v2"]
        );
        assert_eq!(backend.build_env().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_call_through_shell_script() {
        let backend = BridgeBackend::new(
            BridgeConfig::default()
                .with_node("sh")
                .with_script("-c")
                .with_timeout(Some(10)),
        );
        // `sh -c <command> <args...>`: the command slot echoes a fixed envelope
        let resp = backend
            .call("echo '{\"status\":\"success\",\"result\":{}}'", &[])
            .await
            .unwrap();
        assert!(resp.is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_call_reports_stderr() {
        let backend = BridgeBackend::new(BridgeConfig::default().with_node("sh").with_script("-c"));
        let err = backend.call("echo boom >&2; exit 3", &[]).await.unwrap_err();
        match err {
            DownloadError::Execution(msg) => assert_eq!(msg, "boom"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
