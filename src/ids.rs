#![forbid(unsafe_code)]

//! Pure pattern matching that turns arbitrary video URLs into provider ids.
//!
//! YouTube video ids are exactly 11 characters of `[A-Za-z0-9_-]`; playlist
//! ids are the free-length `list=` query parameter; Vimeo ids are the digit
//! run after `vimeo.com/`. Every function returns `None` instead of failing.

/// YouTube video id length is fixed by the platform.
const YOUTUBE_ID_LEN: usize = 11;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Reads a run of id characters starting at `rest` and returns the leading
/// eleven when at least that many are present.
fn take_youtube_id(rest: &str) -> Option<String> {
    let run: String = rest.chars().take_while(|c| is_id_char(*c)).collect();
    if run.len() >= YOUTUBE_ID_LEN {
        Some(run[..YOUTUBE_ID_LEN].to_string())
    } else {
        None
    }
}

/// Returns the value of `key` inside the query string of `url`, if any.
fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    for pair in query.split('&') {
        let Some((candidate, value)) = pair.split_once('=') else {
            continue;
        };
        if candidate == key {
            return Some(value);
        }
    }
    None
}

/// Extracts the video id from any of the known YouTube URL shapes: a watch
/// page (`v=` parameter, regardless of parameter order), a `youtu.be` short
/// link, an embed URL, the legacy `/v/` path and shorts.
pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    if url.contains("youtube.com/watch")
        && let Some(value) = query_param(url, "v")
        && let Some(id) = take_youtube_id(value)
    {
        return Some(id);
    }

    for prefix in [
        "youtu.be/",
        "youtube.com/embed/",
        "youtube.com/v/",
        "youtube.com/shorts/",
    ] {
        if let Some(pos) = url.find(prefix)
            && let Some(id) = take_youtube_id(&url[pos + prefix.len()..])
        {
            return Some(id);
        }
    }
    None
}

/// Extracts a playlist id from the `list=` query parameter.
pub fn extract_youtube_playlist_id(url: &str) -> Option<String> {
    let value = query_param(url, "list")?;
    let run: String = value.chars().take_while(|c| is_id_char(*c)).collect();
    if run.is_empty() { None } else { Some(run) }
}

/// Extracts the numeric Vimeo id from the path after `vimeo.com/`.
pub fn extract_vimeo_id(url: &str) -> Option<String> {
    let pos = url.find("vimeo.com/")?;
    let rest = &url[pos + "vimeo.com/".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Conventional thumbnail path for a YouTube video id.
pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}

/// Canonical watch URL for a YouTube video id.
pub fn youtube_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Builds the embeddable player URL for a YouTube or Vimeo link. Returns
/// `None` when the URL belongs to neither provider, in which case the UI
/// falls back to an external link.
pub fn embed_url(url: &str) -> Option<String> {
    if let Some(id) = extract_youtube_video_id(url) {
        return Some(format!(
            "https://www.youtube.com/embed/{id}?autoplay=1&rel=0&modestbranding=1"
        ));
    }
    if let Some(id) = extract_vimeo_id(url) {
        return Some(format!("https://player.vimeo.com/video/{id}?autoplay=1"));
    }
    None
}
