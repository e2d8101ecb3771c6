// HTTP API - JSON endpoints over the downloader and the media proxy

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::downloader::backends::BridgeBackend;
use crate::downloader::diagnostics::{diagnose_failure, FailureReason};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadDebug, DownloadUrls, UserPost, VideoInfo};
use crate::downloader::naming::DownloadFilenames;
use crate::downloader::orchestrator::{clamp_post_limit, Downloader};
use crate::downloader::proxy::{
    content_disposition, resolve_filename, MediaBody, MediaKind, MediaProxy, ProxyError,
};
use crate::downloader::url::{is_valid_tiktok_url, is_valid_username};

#[derive(Clone)]
pub struct AppState {
    pub downloader: Arc<Downloader>,
    pub proxy: Arc<MediaProxy>,
}

impl AppState {
    pub fn new(downloader: Downloader, proxy: MediaProxy) -> Self {
        Self {
            downloader: Arc::new(downloader),
            proxy: Arc::new(proxy),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<FailureReason>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    reason: Option<FailureReason>,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            reason: None,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            reason: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            success: false,
            reason: self.reason,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DownloadError> for ApiError {
    fn from(e: DownloadError) -> Self {
        let message = e.to_string();
        let reason = match &e {
            DownloadError::AllVersionsFailed(failures) => {
                let diagnosed: Vec<FailureReason> = failures
                    .iter()
                    .filter_map(|f| diagnose_failure(&f.message))
                    .collect();
                diagnosed
                    .iter()
                    .rev()
                    .find(|r| **r != FailureReason::Unknown)
                    .or_else(|| diagnosed.last())
                    .copied()
            }
            _ => diagnose_failure(&message),
        };
        Self {
            reason,
            ..Self::internal(message)
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::InvalidUrl(_) => Self::bad_request("Invalid URL"),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Present and non-empty, else 400 with `message`
fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadResponse {
    success: bool,
    download_urls: DownloadUrls,
    video_info: VideoInfo,
    message: &'static str,
    version: String,
    debug: DownloadDebug,
    filenames: DownloadFilenames,
}

async fn handler_download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Json(request) = payload?;
    let url = required(&request.url, "URL is required")?;

    if !is_valid_tiktok_url(url) {
        return Err(ApiError::bad_request(
            "Invalid TikTok URL. Please use a valid TikTok video URL.",
        ));
    }

    let resolved = state.downloader.resolve_video(url).await.map_err(|e| {
        log::error!("[Server] Download failed for {}: {}", url, e);
        ApiError::from(e)
    })?;

    let filenames = DownloadFilenames::for_video(&resolved.info, &resolved.urls, OffsetDateTime::now_utc());

    Ok(Json(DownloadResponse {
        success: true,
        debug: resolved.urls.debug_summary(),
        download_urls: resolved.urls,
        video_info: resolved.info,
        message: "Video downloaded successfully",
        version: resolved.version,
        filenames,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPostsRequest {
    username: Option<String>,
    post_limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserPostsResponse {
    success: bool,
    posts: Vec<UserPost>,
    total_posts: u64,
    message: &'static str,
}

async fn handler_get_user_posts(
    State(state): State<AppState>,
    payload: Result<Json<UserPostsRequest>, JsonRejection>,
) -> Result<Json<UserPostsResponse>, ApiError> {
    let Json(request) = payload?;
    let username = required(&request.username, "Username is required")?;

    if !is_valid_username(username) {
        return Err(ApiError::bad_request("Invalid username format"));
    }

    let post_limit = clamp_post_limit(request.post_limit);
    let result = state.downloader.user_posts(username, post_limit).await.map_err(|e| {
        log::error!("[Server] Get user posts failed for {}: {}", username, e);
        ApiError::from(e)
    })?;

    Ok(Json(UserPostsResponse {
        success: true,
        posts: result.posts,
        total_posts: result.total_posts,
        message: "User posts fetched successfully",
    }))
}

#[derive(Debug, Deserialize)]
struct ProxyRequest {
    url: Option<String>,
    filename: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn handler_proxy_download_post(
    State(state): State<AppState>,
    payload: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    proxy_download(&state, request).await
}

async fn handler_proxy_download_get(
    State(state): State<AppState>,
    query: Result<Query<ProxyRequest>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(request) = query?;
    proxy_download(&state, request).await
}

async fn proxy_download(state: &AppState, request: ProxyRequest) -> Result<Response, ApiError> {
    let url = required(&request.url, "URL is required")?;
    let kind = MediaKind::from_tag(request.kind.as_deref());
    let filename = resolve_filename(request.filename.as_deref());

    let media = state.proxy.fetch(url).await.map_err(|e| {
        log::error!("[Server] Proxy download error: {}", e);
        ApiError::from(e)
    })?;

    let body = match media.body {
        MediaBody::Streaming(upstream) => Body::from_stream(upstream.bytes_stream()),
        MediaBody::Buffered(bytes) => Body::from(bytes),
    };

    let disposition = HeaderValue::from_str(&content_disposition(filename))
        .map_err(|e| ApiError::internal(format!("Invalid filename: {}", e)))?;

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(kind.content_type()));
    headers.insert(CONTENT_DISPOSITION, disposition);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(media.content_length));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(response)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/download", post(handler_download))
        .route("/get-user-posts", post(handler_get_user_posts))
        .route(
            "/proxy-download",
            get(handler_proxy_download_get).post(handler_proxy_download_post),
        )
}

/// Routes mounted at the root and under `/api`, with an optional static fallback
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new().merge(api_routes()).nest("/api", api_routes());

    if let Some(dir) = static_dir {
        log::info!("[Server] Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.with_state(state)
}

pub async fn start_api_server(config: Config) -> Result<(), String> {
    let backend = BridgeBackend::new(config.bridge_config());
    if !backend.is_available().await {
        log::warn!(
            "[Server] Bridge interpreter '{}' is not available, extraction requests will fail",
            config.node
        );
    }

    let proxy = MediaProxy::new(config.proxy_config()).map_err(|e| e.to_string())?;
    let downloader = Downloader::new(Arc::new(backend));
    log::info!("[Server] Extraction backend: {}", downloader.backend_name());

    let app = router(AppState::new(downloader, proxy), config.static_dir.clone());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to address {}: {}", addr, e))?;
    log::info!("[Server] API server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))
}
