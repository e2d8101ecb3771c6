// Extraction backend trait and the library response envelope

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::errors::DownloadError;
use super::models::count_value;

/// Extraction strategy of the downloader library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
    V3,
}

impl ApiVersion {
    /// Priority order used by the resolver
    pub const ALL: [ApiVersion; 3] = [ApiVersion::V1, ApiVersion::V2, ApiVersion::V3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

/// `{status, message, result, totalPosts}` as returned by every library call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: ApiStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_posts: Option<u64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub version: Option<String>,
}

/// Counter sent as a number, a float or a numeric string; `null` stays absent
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| count_value(Some(&v))))
}

/// Non-empty string, or a number rendered as text
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl ApiResponse {
    pub fn success(result: Value) -> Self {
        Self {
            status: ApiStatus::Success,
            message: None,
            result: Some(result),
            total_posts: None,
            version: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Error,
            message: Some(message.into()),
            result: None,
            total_posts: None,
            version: None,
        }
    }

    pub fn with_total_posts(mut self, total: u64) -> Self {
        self.total_posts = Some(total);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ApiStatus::Success
    }

    /// Library message, ignoring blank strings
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// The external extraction library, as seen by this service
#[async_trait]
pub trait TiktokBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Resolve a single video page with the given extraction version
    async fn download(&self, url: &str, version: ApiVersion) -> Result<ApiResponse, DownloadError>;

    /// List the most recent posts of a user
    async fn user_posts(&self, username: &str, post_limit: u32) -> Result<ApiResponse, DownloadError>;
}
