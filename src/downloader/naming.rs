// Suggested filenames for proxied downloads

use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;

use super::models::{DownloadUrls, VideoInfo};

/// Filenames offered to the browser for each link of a resolved video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFilenames {
    pub video_no_watermark: String,
    pub video_with_watermark: String,
    pub music: String,
}

impl DownloadFilenames {
    pub fn for_video(info: &VideoInfo, urls: &DownloadUrls, at: OffsetDateTime) -> Self {
        let stamp = timestamp(at);
        let username = info.author.username.trim_start_matches('@');
        let username = if username.is_empty() { "tiktok" } else { username };

        let pick = |url: &Option<String>, name: String| if url.is_some() { name } else { String::new() };

        Self {
            video_no_watermark: pick(
                &urls.video_no_watermark,
                format!("{}_no_watermark_{}.mp4", sanitize(username), stamp),
            ),
            video_with_watermark: pick(
                &urls.video_with_watermark,
                format!("{}_watermark_{}.mp4", sanitize(username), stamp),
            ),
            music: pick(
                &urls.music,
                format!("{}_{}.mp3", alphanumeric_only(&info.music.title), stamp),
            ),
        }
    }
}

pub fn post_video_filename(username: &str, post_id: &str) -> String {
    format!("tiktok_{}_{}.mp4", sanitize(username), sanitize(post_id))
}

pub fn post_music_filename(author: &str, title: &str) -> String {
    format!("tiktok_music_{}_{}.mp3", sanitize(author), sanitize(title))
}

/// `2024-05-01T12-30-05`: ISO-8601 with the colons replaced
fn timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");
    at.format(&format).unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Strip characters that are unsafe in a filename on common filesystems
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

fn alphanumeric_only(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "music".to_string()
    } else {
        cleaned
    }
}
