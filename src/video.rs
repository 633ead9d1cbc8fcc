//! Video URL helpers.
//!
//! Uses LazyLock to compile patterns once on first use.

use std::sync::LazyLock;

use regex::Regex;

/// YouTube watch or short link: `https://www.youtube.com/watch?v=ID`, `https://youtu.be/ID`.
static WATCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(www\.)?(youtube\.com/watch\?v=|youtu\.be/)(?P<id>[A-Za-z0-9_-]+)(&.*)?$")
        .unwrap()
});

/// YouTube embed link: `https://www.youtube.com/embed/ID`.
static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(www\.)?youtube\.com/embed/(?P<id>[A-Za-z0-9_-]+)([?&].*)?$").unwrap()
});

/// Legacy OLX `youtube` attribute: `1.00:ID,1.50:ID2`.
static LEGACY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|,)\s*1(?:\.0+)?:(?P<id>[A-Za-z0-9_-]+)").unwrap());

/// Video file extensions recognized as direct sources.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "ogg", "webm"];

/// The video ID of a YouTube watch URL.
pub fn youtube_id(url: &str) -> Option<&str> {
    WATCH_RE
        .captures(url.trim())
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str())
}

/// The video ID of a YouTube embed URL.
pub fn youtube_embed_id(url: &str) -> Option<&str> {
    EMBED_RE
        .captures(url.trim())
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str())
}

/// The normal-speed video ID of a legacy `youtube` attribute.
pub fn legacy_youtube_id(value: &str) -> Option<&str> {
    LEGACY_RE
        .captures(value)
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str())
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

pub fn embed_url(id: &str) -> String {
    format!("https://www.youtube.com/embed/{id}")
}

pub fn is_youtube(url: &str) -> bool {
    youtube_id(url).is_some()
}

/// Whether a URL points to a video file, by extension.
pub fn has_video_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit_once('.').is_some_and(|(_, ext)| {
        VIDEO_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

/// Whether a URL can be the first source of a video unit.
pub fn is_video_source(url: &str) -> bool {
    is_youtube(url) || has_video_extension(url)
}
