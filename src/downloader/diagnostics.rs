// Failure diagnostics - classifies extraction error texts
//
// The extraction library reports failures as free text. Mapping that text to a
// small set of reasons lets the API attach a stable `reason` tag next to the
// human-readable error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Account is private; its posts are not listed
    PrivateAccount,

    /// Video deleted, taken down or never existed
    VideoUnavailable,

    /// TikTok is throttling this host
    RateLimited,

    /// Content not served in the host's region
    RegionBlocked,

    /// Upstream did not answer in time
    NetworkTimeout,

    /// Bridge interpreter or script missing
    BridgeUnavailable,

    /// Library answered with something that is not a response envelope
    InvalidResponse,

    Unknown,
}

impl FailureReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::PrivateAccount => "The account is private",
            Self::VideoUnavailable => "The video is unavailable or was removed",
            Self::RateLimited => "Rate limited by TikTok",
            Self::RegionBlocked => "Not available in this region",
            Self::NetworkTimeout => "Network timeout",
            Self::BridgeUnavailable => "Extraction bridge is not installed",
            Self::InvalidResponse => "Extraction returned an unreadable response",
            Self::Unknown => "Unknown failure",
        }
    }
}

/// Analyze error message and return failure reason
pub fn diagnose_failure(error: &str) -> Option<FailureReason> {
    let lower = error.to_lowercase();

    if lower.trim().is_empty() {
        return None;
    }

    if lower.contains("tool not found") || lower.contains("cannot find module") {
        return Some(FailureReason::BridgeUnavailable);
    }

    if lower.contains("parse error") || lower.contains("invalid json") {
        return Some(FailureReason::InvalidResponse);
    }

    if lower.contains("private") {
        return Some(FailureReason::PrivateAccount);
    }

    if lower.contains("not found")
        || lower.contains("status code 404")
        || lower.contains("404 not found")
        || lower.contains("unavailable")
        || lower.contains("removed")
        || lower.contains("deleted")
    {
        return Some(FailureReason::VideoUnavailable);
    }

    if lower.contains("status code 429")
        || lower.contains("rate limit")
        || lower.contains("too many requests")
    {
        return Some(FailureReason::RateLimited);
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("not available in your region")
        || lower.contains("region restricted")
        || lower.contains("geo-restricted")
        || lower.contains("geo restricted")
        || lower.contains("geographic restriction")
    {
        return Some(FailureReason::RegionBlocked);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("econnreset")
        || lower.contains("connection refused")
    {
        return Some(FailureReason::NetworkTimeout);
    }

    Some(FailureReason::Unknown)
}
