// Response DTOs and the normalization from the library's loose JSON
//
// The extraction library returns deeply nested, optionally-absent fields whose
// types drift between versions (a cover may be a string or a ranked list, a
// counter may be a number or a numeric string). Every mapping below is total:
// missing or malformed input falls back to the documented default.

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::naming;

const DEFAULT_TITLE: &str = "TikTok Video";
const DEFAULT_USERNAME: &str = "@username";
const DEFAULT_NICKNAME: &str = "User";
const DEFAULT_MUSIC_TITLE: &str = "Original Sound";
const DEFAULT_MUSIC_AUTHOR: &str = "Unknown";

/// Non-empty string at `pointer`; numbers are rendered as text
fn text(v: &Value, pointer: &str) -> Option<String> {
    match v.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_or(v: &Value, pointer: &str, default: &str) -> String {
    text(v, pointer).unwrap_or_else(|| default.to_string())
}

/// First candidate of a ranked URL field (plain strings count as a single candidate)
fn first_text(v: &Value, pointer: &str) -> Option<String> {
    match v.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => match items.first()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Element `index` of a ranked URL list
fn nth_text(v: &Value, pointer: &str, index: usize) -> Option<String> {
    match v.pointer(pointer)?.as_array()?.get(index)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Non-negative counter; negative or unparsable values read as 0
fn count(v: &Value, pointer: &str) -> u64 {
    count_value(v.pointer(pointer))
}

/// Counter rule applied to a single value (number or numeric string)
pub(crate) fn count_value(value: Option<&Value>) -> u64 {
    let as_float = match value {
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                return u;
            }
            n.as_f64()
        }
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match as_float {
        Some(f) if f.is_finite() && f > 0.0 => f.round() as u64,
        _ => 0,
    }
}

fn flag(v: &Value, pointer: &str) -> bool {
    v.pointer(pointer).and_then(Value::as_bool).unwrap_or(false)
}

fn empty_when_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub username: String,
    pub nickname: String,
    pub avatar_medium: String,
    pub signature: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub plays: u64,
    pub downloads: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoDetails {
    /// Seconds
    pub duration: u64,
    pub ratio: String,
    pub cover: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MusicInfo {
    pub title: String,
    pub author: String,
    pub duration: u64,
}

/// Metadata of a single resolved video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoInfo {
    pub title: String,
    pub author: AuthorInfo,
    pub statistics: Statistics,
    pub video: VideoDetails,
    pub music: MusicInfo,
}

impl VideoInfo {
    pub fn from_result(r: &Value) -> Self {
        Self {
            title: text_or(r, "/desc", DEFAULT_TITLE),
            author: AuthorInfo {
                username: text_or(r, "/author/username", DEFAULT_USERNAME),
                nickname: text_or(r, "/author/nickname", DEFAULT_NICKNAME),
                avatar_medium: first_text(r, "/author/avatarMedium").unwrap_or_default(),
                signature: text_or(r, "/author/signature", ""),
                region: text_or(r, "/author/region", ""),
            },
            statistics: Statistics {
                likes: count(r, "/statistics/likeCount"),
                comments: count(r, "/statistics/commentCount"),
                shares: count(r, "/statistics/shareCount"),
                plays: count(r, "/statistics/playCount"),
                downloads: count(r, "/statistics/downloadCount"),
            },
            video: VideoDetails {
                duration: count(r, "/video/duration"),
                ratio: text_or(r, "/video/ratio", ""),
                cover: first_text(r, "/video/dynamicCover")
                    .or_else(|| first_text(r, "/video/cover"))
                    .unwrap_or_default(),
            },
            music: MusicInfo {
                title: text_or(r, "/music/title", DEFAULT_MUSIC_TITLE),
                author: text_or(r, "/music/author", DEFAULT_MUSIC_AUTHOR),
                duration: count(r, "/music/duration"),
            },
        }
    }
}

/// Direct media links; any of them may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrls {
    #[serde(serialize_with = "empty_when_none")]
    pub video_no_watermark: Option<String>,
    #[serde(serialize_with = "empty_when_none")]
    pub video_with_watermark: Option<String>,
    #[serde(serialize_with = "empty_when_none")]
    pub music: Option<String>,
}

impl DownloadUrls {
    /// `playAddr[0]` (or a lone string) is the clean encode, `playAddr[1]` the watermarked one
    pub fn from_result(r: &Value) -> Self {
        Self {
            video_no_watermark: first_text(r, "/video/playAddr"),
            video_with_watermark: nth_text(r, "/video/playAddr", 1),
            music: first_text(r, "/music/playUrl"),
        }
    }

    pub fn has_video(&self) -> bool {
        self.video_no_watermark.is_some() || self.video_with_watermark.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_video() && self.music.is_none()
    }

    pub fn debug_summary(&self) -> DownloadDebug {
        let video_count = [&self.video_no_watermark, &self.video_with_watermark]
            .iter()
            .filter(|u| u.is_some())
            .count();

        DownloadDebug {
            has_video_url: self.has_video(),
            has_music_url: self.music.is_some(),
            possible_video_urls: video_count,
            possible_music_urls: usize::from(self.music.is_some()),
            cookie_used: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDebug {
    pub has_video_url: bool,
    pub has_music_url: bool,
    pub possible_video_urls: usize,
    pub possible_music_urls: usize,
    pub cookie_used: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub collect_count: u64,
    pub comment_count: u64,
    pub like_count: u64,
    pub play_count: u64,
    pub share_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: String,
    pub username: String,
    pub nickname: String,
    pub avatar_larger: String,
    pub avatar_thumb: String,
    pub avatar_medium: String,
    pub signature: String,
    pub verified: bool,
    pub open_favorite: bool,
    pub private_account: bool,
    #[serde(rename = "isADVirtual")]
    pub is_ad_virtual: bool,
    pub is_embed_banned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVideo {
    pub id: String,
    pub duration: u64,
    pub ratio: String,
    pub cover: String,
    pub origin_cover: String,
    pub dynamic_cover: String,
    pub play_addr: String,
    pub download_addr: String,
    pub format: String,
    pub bitrate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMusic {
    pub author_name: String,
    pub cover_large: String,
    pub cover_medium: String,
    pub cover_thumb: String,
    pub duration: u64,
    pub id: String,
    pub title: String,
    pub play_url: String,
    pub original: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostFilenames {
    pub video: String,
    pub music: String,
}

/// One entry of a user's post list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPost {
    pub id: String,
    pub desc: String,
    /// Seconds since the epoch
    pub create_time: u64,
    pub stats: PostStats,
    pub author: PostAuthor,
    pub video: Option<PostVideo>,
    pub music: Option<PostMusic>,
    pub images: Vec<String>,
    pub url: String,
    pub filenames: PostFilenames,
}

impl UserPost {
    /// `username` is the requested account, used when the post omits its author
    pub fn from_result(p: &Value, username: &str) -> Self {
        let id = text_or(p, "/id", "");
        let author = PostAuthor {
            id: text_or(p, "/author/id", ""),
            username: text_or(p, "/author/username", username),
            nickname: text_or(p, "/author/nickname", ""),
            avatar_larger: first_text(p, "/author/avatarLarger").unwrap_or_default(),
            avatar_thumb: first_text(p, "/author/avatarThumb").unwrap_or_default(),
            avatar_medium: first_text(p, "/author/avatarMedium").unwrap_or_default(),
            signature: text_or(p, "/author/signature", ""),
            verified: flag(p, "/author/verified"),
            open_favorite: flag(p, "/author/openFavorite"),
            private_account: flag(p, "/author/privateAccount"),
            is_ad_virtual: flag(p, "/author/isADVirtual"),
            is_embed_banned: flag(p, "/author/isEmbedBanned"),
        };

        let video = p.get("video").filter(|v| v.is_object()).map(|v| PostVideo {
            id: text_or(v, "/id", ""),
            duration: count(v, "/duration"),
            ratio: text_or(v, "/ratio", ""),
            cover: first_text(v, "/cover").unwrap_or_default(),
            origin_cover: first_text(v, "/originCover").unwrap_or_default(),
            dynamic_cover: first_text(v, "/dynamicCover").unwrap_or_default(),
            play_addr: first_text(v, "/playAddr").unwrap_or_default(),
            download_addr: first_text(v, "/downloadAddr").unwrap_or_default(),
            format: text_or(v, "/format", ""),
            bitrate: count(v, "/bitrate"),
        });

        let music = p.get("music").filter(|m| m.is_object()).map(|m| PostMusic {
            author_name: text_or(m, "/authorName", ""),
            cover_large: first_text(m, "/coverLarge").unwrap_or_default(),
            cover_medium: first_text(m, "/coverMedium").unwrap_or_default(),
            cover_thumb: first_text(m, "/coverThumb").unwrap_or_default(),
            duration: count(m, "/duration"),
            id: text_or(m, "/id", ""),
            title: text_or(m, "/title", ""),
            play_url: first_text(m, "/playUrl").unwrap_or_default(),
            original: flag(m, "/original"),
        });

        let images = p
            .get("images")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| first_text(item, ""))
                    .collect()
            })
            .unwrap_or_default();

        let filenames = PostFilenames {
            video: naming::post_video_filename(&author.username, &id),
            music: naming::post_music_filename(
                music.as_ref().map_or("", |m| m.author_name.as_str()),
                music.as_ref().map_or("", |m| m.title.as_str()),
            ),
        };

        Self {
            url: format!("https://www.tiktok.com/@{}/video/{}", username, id),
            desc: text_or(p, "/desc", ""),
            create_time: count(p, "/createTime"),
            stats: PostStats {
                collect_count: count(p, "/stats/collectCount"),
                comment_count: count(p, "/stats/commentCount"),
                like_count: count(p, "/stats/likeCount"),
                play_count: count(p, "/stats/playCount"),
                share_count: count(p, "/stats/shareCount"),
            },
            id,
            author,
            video,
            music,
            images,
            filenames,
        }
    }
}
