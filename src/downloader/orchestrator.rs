// Orchestrator with version fallback logic

use serde_json::Value;
use std::sync::Arc;

use super::diagnostics::diagnose_failure;
use super::errors::{DownloadError, VersionFailure};
use super::models::{DownloadUrls, UserPost, VideoInfo};
use super::traits::{ApiResponse, ApiVersion, TiktokBackend};
use super::url::extract_video_key;

pub const DEFAULT_POST_LIMIT: u32 = 30;
pub const MIN_POST_LIMIT: u32 = 1;
pub const MAX_POST_LIMIT: u32 = 50;

/// Clamp a caller-supplied post limit into `[1, 50]`, defaulting to 30
pub fn clamp_post_limit(requested: Option<i64>) -> u32 {
    match requested {
        Some(n) => n.clamp(MIN_POST_LIMIT as i64, MAX_POST_LIMIT as i64) as u32,
        None => DEFAULT_POST_LIMIT,
    }
}

/// A video resolved by one of the extraction versions
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    /// Version reported by the library, or the tag of the attempt that succeeded
    pub version: String,
    pub info: VideoInfo,
    pub urls: DownloadUrls,
}

#[derive(Debug, Clone)]
pub struct UserPosts {
    pub posts: Vec<UserPost>,
    pub total_posts: u64,
}

pub struct Downloader {
    backend: Arc<dyn TiktokBackend>,
}

impl Downloader {
    pub fn new(backend: Arc<dyn TiktokBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Resolve a validated video URL into metadata and download links
    pub async fn resolve_video(&self, url: &str) -> Result<ResolvedVideo, DownloadError> {
        let (response, version) = self.download_with_fallback(url).await?;
        let result = response.result.unwrap_or(Value::Null);

        let urls = DownloadUrls::from_result(&result);
        if urls.is_empty() {
            log::warn!("[Downloader] {} resolved {} but returned no media links", version, url);
        }

        Ok(ResolvedVideo {
            version: response.version.unwrap_or_else(|| version.to_string()),
            info: VideoInfo::from_result(&result),
            urls,
        })
    }

    /// Try each version in order and stop at the first success
    pub async fn download_with_fallback(
        &self,
        url: &str,
    ) -> Result<(ApiResponse, ApiVersion), DownloadError> {
        let target = extract_video_key(url)
            .map(|key| key.to_string())
            .unwrap_or_else(|| url.to_string());
        let mut failures = Vec::with_capacity(ApiVersion::ALL.len());

        for version in ApiVersion::ALL {
            log::info!("[Downloader] Trying {} via {} for {}", version, self.backend.name(), target);

            match self.attempt(url, version).await {
                Ok(response) => {
                    log::info!("[Downloader] ✓ Success with {}", version);
                    return Ok((response, version));
                }
                Err(message) => {
                    let reason = diagnose_failure(&message)
                        .map(|r| r.description())
                        .unwrap_or("no diagnosis");
                    log::warn!("[Downloader] ✗ {} failed: {} ({})", version, message, reason);
                    failures.push(VersionFailure::new(version, message));
                }
            }
        }

        Err(DownloadError::AllVersionsFailed(failures))
    }

    /// One extraction call, reduced to the response or a failure message
    async fn attempt(&self, url: &str, version: ApiVersion) -> Result<ApiResponse, String> {
        let message = match self.backend.download(url, version).await {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => response.message().map(str::to_string),
            Err(e) => Some(e.to_string()).filter(|m| !m.trim().is_empty()),
        };

        Err(message.unwrap_or_else(|| format!("{} failed", version)))
    }

    /// First `post_limit` posts of `username`
    pub async fn user_posts(&self, username: &str, post_limit: u32) -> Result<UserPosts, DownloadError> {
        log::info!("[Downloader] Getting posts for user: {} with limit: {}", username, post_limit);

        let response = self.backend.user_posts(username, post_limit).await?;

        if !response.is_success() {
            let message = response.message().unwrap_or("Failed to fetch user posts");
            return Err(DownloadError::Upstream(message.to_string()));
        }

        let posts: Vec<UserPost> = response
            .result
            .as_ref()
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .take(post_limit as usize)
                    .map(|item| UserPost::from_result(item, username))
                    .collect()
            })
            .unwrap_or_default();

        let total_posts = response
            .total_posts
            .filter(|total| *total > 0)
            .unwrap_or(posts.len() as u64);

        log::info!("[Downloader] Fetched {} posts for {}", posts.len(), username);
        Ok(UserPosts { posts, total_posts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Backend that replays a fixed outcome per version and records the calls
    struct ScriptedBackend {
        outcomes: HashMap<ApiVersion, Result<ApiResponse, DownloadError>>,
        posts: Option<ApiResponse>,
        calls: Mutex<Vec<ApiVersion>>,
        post_limits: Mutex<Vec<u32>>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                outcomes: HashMap::new(),
                posts: None,
                calls: Mutex::new(Vec::new()),
                post_limits: Mutex::new(Vec::new()),
            }
        }

        fn on(mut self, version: ApiVersion, outcome: Result<ApiResponse, DownloadError>) -> Self {
            self.outcomes.insert(version, outcome);
            self
        }

        fn with_posts(mut self, response: ApiResponse) -> Self {
            self.posts = Some(response);
            self
        }

        fn calls(&self) -> Vec<ApiVersion> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TiktokBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn download(&self, _url: &str, version: ApiVersion) -> Result<ApiResponse, DownloadError> {
            self.calls.lock().unwrap().push(version);
            self.outcomes
                .get(&version)
                .cloned()
                .unwrap_or_else(|| Err(DownloadError::Upstream(format!("{} not scripted", version))))
        }

        async fn user_posts(&self, _username: &str, post_limit: u32) -> Result<ApiResponse, DownloadError> {
            self.post_limits.lock().unwrap().push(post_limit);
            self.posts
                .clone()
                .ok_or_else(|| DownloadError::Upstream("no posts scripted".to_string()))
        }
    }

    const URL: &str = "https://www.tiktok.com/@user/video/123";

    #[tokio::test]
    async fn test_first_success_stops_fallback() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .on(ApiVersion::V1, Err(DownloadError::Upstream("v1 exploded".to_string())))
                .on(ApiVersion::V2, Ok(ApiResponse::success(json!({"desc": "from v2"}))))
                .on(ApiVersion::V3, Ok(ApiResponse::success(json!({"desc": "from v3"})))),
        );
        let downloader = Downloader::new(backend.clone());

        let resolved = downloader.resolve_video(URL).await.unwrap();
        assert_eq!(resolved.info.title, "from v2");
        assert_eq!(resolved.version, "v2");
        assert_eq!(backend.calls(), vec![ApiVersion::V1, ApiVersion::V2]);
    }

    #[tokio::test]
    async fn test_v1_success_never_tries_others() {
        let backend = Arc::new(
            ScriptedBackend::new().on(ApiVersion::V1, Ok(ApiResponse::success(json!({})))),
        );
        let downloader = Downloader::new(backend.clone());

        downloader.resolve_video(URL).await.unwrap();
        assert_eq!(backend.calls(), vec![ApiVersion::V1]);
    }

    #[tokio::test]
    async fn test_all_failures_are_aggregated_in_order() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .on(ApiVersion::V1, Err(DownloadError::Timeout(30)))
                .on(ApiVersion::V2, Ok(ApiResponse::error("video is private")))
                .on(ApiVersion::V3, Err(DownloadError::Parse("bad json".to_string()))),
        );
        let downloader = Downloader::new(backend.clone());

        let err = downloader.resolve_video(URL).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "All download methods failed: Timed out after 30s, video is private, Parse error: bad json"
        );
        assert_eq!(backend.calls(), ApiVersion::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_non_success_without_message_uses_version_tag() {
        let silent = ApiResponse {
            message: None,
            ..ApiResponse::error("")
        };
        let backend = Arc::new(
            ScriptedBackend::new()
                .on(ApiVersion::V1, Ok(silent.clone()))
                .on(ApiVersion::V2, Ok(silent.clone()))
                .on(ApiVersion::V3, Err(DownloadError::Upstream(String::new()))),
        );
        let downloader = Downloader::new(backend);

        let err = downloader.resolve_video(URL).await.unwrap_err();
        assert_eq!(err.failure_messages(), vec!["v1 failed", "v2 failed", "v3 failed"]);
    }

    #[tokio::test]
    async fn test_library_version_is_reported() {
        let mut response = ApiResponse::success(json!({"video": {"playAddr": ["a", "b"]}}));
        response.version = Some("v1-beta".to_string());
        let backend = Arc::new(ScriptedBackend::new().on(ApiVersion::V1, Ok(response)));

        let resolved = Downloader::new(backend).resolve_video(URL).await.unwrap();
        assert_eq!(resolved.version, "v1-beta");
        assert_eq!(resolved.urls.video_no_watermark.as_deref(), Some("a"));
        assert_eq!(resolved.urls.video_with_watermark.as_deref(), Some("b"));
    }

    #[test]
    fn test_clamp_post_limit() {
        assert_eq!(clamp_post_limit(None), 30);
        assert_eq!(clamp_post_limit(Some(0)), 1);
        assert_eq!(clamp_post_limit(Some(-5)), 1);
        assert_eq!(clamp_post_limit(Some(999)), 50);
        assert_eq!(clamp_post_limit(Some(12)), 12);
    }

    #[tokio::test]
    async fn test_user_posts_truncated_and_counted() {
        let posts: Vec<Value> = (0..5).map(|i| json!({"id": i.to_string()})).collect();
        let backend = Arc::new(
            ScriptedBackend::new().with_posts(ApiResponse::success(Value::Array(posts))),
        );
        let downloader = Downloader::new(backend.clone());

        let result = downloader.user_posts("someone", 3).await.unwrap();
        assert_eq!(result.posts.len(), 3);
        assert_eq!(result.total_posts, 3);
        assert_eq!(result.posts[2].url, "https://www.tiktok.com/@someone/video/2");
        assert_eq!(*backend.post_limits.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_user_posts_total_from_library() {
        let backend = Arc::new(ScriptedBackend::new().with_posts(
            ApiResponse::success(json!([{"id": "1"}])).with_total_posts(250),
        ));

        let result = Downloader::new(backend).user_posts("someone", 30).await.unwrap();
        assert_eq!(result.posts.len(), 1);
        assert_eq!(result.total_posts, 250);
    }

    #[tokio::test]
    async fn test_user_posts_error_status() {
        let backend = Arc::new(ScriptedBackend::new().with_posts(ApiResponse {
            message: None,
            ..ApiResponse::error("")
        }));

        let err = Downloader::new(backend).user_posts("someone", 30).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch user posts");
    }
}
