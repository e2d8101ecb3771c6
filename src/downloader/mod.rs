// Downloader module - TikTok resolution, reshaping and media proxying

pub mod backends;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod proxy;
pub mod traits;
pub mod url;
pub mod utils;

pub use diagnostics::{diagnose_failure, FailureReason};
pub use errors::{DownloadError, VersionFailure};
pub use models::{DownloadDebug, DownloadUrls, UserPost, VideoInfo};
pub use naming::DownloadFilenames;
pub use orchestrator::{clamp_post_limit, Downloader, ResolvedVideo, UserPosts};
pub use proxy::{MediaKind, MediaProxy, ProxyConfig, ProxyError};
pub use traits::{ApiResponse, ApiStatus, ApiVersion, TiktokBackend};
pub use url::{extract_video_key, is_valid_tiktok_url, is_valid_username, VideoKey};
