//! Content-type helpers.

/// Returns the lowercased media type of a `Content-Type` value with parameters stripped,
/// e.g. `Video/MP4; codecs="avc1"` becomes `video/mp4`.
///
/// Returns `None` when the value is not of the `type/subtype` form.
pub fn essence(content_type: &str) -> Option<String> {
    let media_type = content_type.split(';').next()?.trim().to_lowercase();
    let (kind, subtype) = media_type.split_once('/')?;
    if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return None;
    }
    if media_type.chars().any(char::is_whitespace) {
        return None;
    }
    Some(media_type)
}

/// True when `content_type` names exactly `expected` (parameters ignored).
pub fn is_media_type(content_type: &str, expected: &str) -> bool {
    essence(content_type).is_some_and(|e| e == expected)
}
