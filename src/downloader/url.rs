// TikTok URL and username validation

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    // https://www.tiktok.com/@user.name/video/7234567890123456789?is_from_webapp=1
    static ref DESKTOP_RE: Regex = Regex::new(
        r"^https?://(www\.)?tiktok\.com/@[A-Za-z0-9_.-]+/video/[0-9]+(\?[A-Za-z0-9_=&-]+)?$"
    ).unwrap();
    // https://www.tiktok.com/t/ZP8abc123/
    static ref MOBILE_RE: Regex = Regex::new(
        r"^https?://(www\.)?tiktok\.com/t/Z[A-Za-z0-9]+/?(\?[A-Za-z0-9_=&-]+)?$"
    ).unwrap();
    static ref VIDEO_ID_RE: Regex = Regex::new(r"/video/([0-9]+)").unwrap();
    static ref SHORT_CODE_RE: Regex = Regex::new(r"/t/(Z[A-Za-z0-9]+)").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9._]+$").unwrap();
}

/// Identifier pulled out of a TikTok video URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoKey {
    /// Numeric id from `/@user/video/<id>`
    VideoId(String),
    /// Short code from `/t/Z.../`
    ShortCode(String),
}

impl VideoKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::VideoId(id) | Self::ShortCode(id) => id,
        }
    }
}

impl fmt::Display for VideoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::VideoId(_) => "video",
            Self::ShortCode(_) => "short link",
        };
        write!(f, "{} {}", label, self.as_str())
    }
}

/// True iff `url` is a desktop video link or a mobile short link
pub fn is_valid_tiktok_url(url: &str) -> bool {
    DESKTOP_RE.is_match(url) || MOBILE_RE.is_match(url)
}

pub fn extract_video_key(url: &str) -> Option<VideoKey> {
    if let Some(caps) = VIDEO_ID_RE.captures(url) {
        return Some(VideoKey::VideoId(caps[1].to_string()));
    }

    SHORT_CODE_RE
        .captures(url)
        .map(|caps| VideoKey::ShortCode(caps[1].to_string()))
}

// Unicode handles are rejected on purpose until the bridge is known to accept them.
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_urls_accepted() {
        for url in [
            "https://www.tiktok.com/@user/video/123",
            "http://tiktok.com/@some.user-name_1/video/7234567890123456789",
            "https://www.tiktok.com/@user/video/123?is_from_webapp=1&sender_device=pc",
        ] {
            assert!(is_valid_tiktok_url(url), "expected valid: {}", url);
        }
    }

    #[test]
    fn test_mobile_urls_accepted() {
        for url in [
            "https://www.tiktok.com/t/ZP8abc123/",
            "https://tiktok.com/t/ZTRabc",
            "https://www.tiktok.com/t/ZP8abc123/?k=1",
        ] {
            assert!(is_valid_tiktok_url(url), "expected valid: {}", url);
        }
    }

    #[test]
    fn test_other_strings_rejected() {
        for url in [
            "",
            "tiktok.com/@user/video/123",
            "HTTPS://www.tiktok.com/@user/video/123",
            "https://www.tiktok.com/@user/video/abc",
            "https://www.tiktok.com/@user",
            "https://m.tiktok.com/@user/video/123",
            "https://www.tiktok.com/t/AP8abc/",
            "https://www.youtube.com/watch?v=123",
            "https://www.tiktok.com/@user/video/123 trailing",
            "https://www.tiktok.com/@üser/video/123",
        ] {
            assert!(!is_valid_tiktok_url(url), "expected invalid: {}", url);
        }
    }

    #[test]
    fn test_extract_video_key() {
        assert_eq!(
            extract_video_key("https://www.tiktok.com/@user/video/123?x=1"),
            Some(VideoKey::VideoId("123".to_string()))
        );
        assert_eq!(
            extract_video_key("https://www.tiktok.com/t/ZP8abc/"),
            Some(VideoKey::ShortCode("ZP8abc".to_string()))
        );
        assert_eq!(extract_video_key("https://example.com/"), None);
    }

    #[test]
    fn test_video_key_labels() {
        let key = extract_video_key("https://www.tiktok.com/@user/video/123").unwrap();
        assert_eq!(key.as_str(), "123");
        assert_eq!(key.to_string(), "video 123");

        let key = extract_video_key("https://vm.tiktok.com/t/ZP8abc").map(|k| k.to_string());
        assert_eq!(key.as_deref(), Some("short link ZP8abc"));
    }

    #[test]
    fn test_username_format() {
        assert!(is_valid_username("charli.d_amelio9"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("@user"));
        assert!(!is_valid_username("user name"));
        assert!(!is_valid_username("ユーザー"));
    }
}
