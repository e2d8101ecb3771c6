// Media proxy - fetches CDN resources on behalf of the browser
//
// The TikTok CDN rejects hot-linked requests, so media is fetched server-side
// with a browser user agent and a TikTok referer and re-served from our origin.

use reqwest::header::{REFERER, USER_AGENT};
use thiserror::Error;

use super::utils::format_file_size;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const TIKTOK_REFERER: &str = "https://www.tiktok.com/";
pub const DEFAULT_FILENAME: &str = "download";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch file: {status} {reason}")]
    UpstreamStatus { status: u16, reason: String },

    #[error("Failed to fetch file: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Media type tag sent by the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Other,
}

impl MediaKind {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("video") => Self::Video,
            Some("audio") => Self::Audio,
            _ => Self::Other,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Video => "video/mp4",
            Self::Audio => "audio/mpeg",
            Self::Other => "application/octet-stream",
        }
    }
}

/// Caller-supplied filename, or `download` when absent or blank
pub fn resolve_filename(filename: Option<&str>) -> &str {
    filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FILENAME)
}

/// `attachment; filename="..."`, with an RFC 5987 variant for non-ASCII names
pub fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if safe.is_ascii() {
        return format!("attachment; filename=\"{}\"", safe);
    }

    let fallback: String = safe
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(&safe)
    )
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub user_agent: String,
    pub referer: String,
    /// Outbound HTTP or SOCKS5 proxy for CDN requests
    pub proxy: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            referer: TIKTOK_REFERER.to_string(),
            proxy: None,
        }
    }
}

impl ProxyConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

pub enum MediaBody {
    /// Upstream declared its length; bytes are forwarded as they arrive
    Streaming(reqwest::Response),
    /// Upstream length unknown; fully read to compute it
    Buffered(Vec<u8>),
}

pub struct UpstreamMedia {
    pub content_length: u64,
    pub body: MediaBody,
}

pub struct MediaProxy {
    client: reqwest::Client,
    config: ProxyConfig,
}

impl MediaProxy {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ProxyError::Client(format!("invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProxyError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub async fn fetch(&self, url: &str) -> Result<UpstreamMedia, ProxyError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProxyError::InvalidUrl(format!("unsupported scheme: {}", parsed.scheme())));
        }

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, &self.config.user_agent)
            .header(REFERER, &self.config.referer)
            .send()
            .await?;

        let status = response.status();
        log::info!("[Proxy] Upstream answered {} for {}", status, url);

        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        match response.content_length() {
            Some(length) => {
                log::info!("[Proxy] Streaming {}", format_file_size(length));
                Ok(UpstreamMedia {
                    content_length: length,
                    body: MediaBody::Streaming(response),
                })
            }
            None => {
                let bytes = response.bytes().await?.to_vec();
                log::info!("[Proxy] Buffered {}", format_file_size(bytes.len() as u64));
                Ok(UpstreamMedia {
                    content_length: bytes.len() as u64,
                    body: MediaBody::Buffered(bytes),
                })
            }
        }
    }
}
