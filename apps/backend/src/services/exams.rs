//! Exam paper helpers: image file names and explanation video links.

use once_cell::sync::Lazy;
use regex::Regex;

/// Question number and extension of an uploaded image named `<number>.<ext>`.
pub fn parse_question_file(file_name: &str) -> Option<(u32, String)> {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, extension) = name.split_once('.')?;
    let number = stem.trim().parse::<u32>().ok()?;
    let extension = extension.rsplit('.').next().unwrap_or(extension);
    if extension.is_empty() {
        return None;
    }
    Some((number, extension.to_ascii_lowercase()))
}

/// Start offset in seconds from a `t=` or `start=` query parameter.
pub fn youtube_start_seconds(url: &str) -> u32 {
    static START: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[?&](t|start)=(\d+)").expect("valid start-time pattern"));

    START
        .captures(url)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Empty links are allowed (no video); anything else must be http(s).
pub fn is_valid_video_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_file() {
        assert_eq!(parse_question_file("3.png"), Some((3, "png".to_string())));
        assert_eq!(parse_question_file("12.JPG"), Some((12, "jpg".to_string())));
        assert_eq!(parse_question_file("scans/07.jpeg"), Some((7, "jpeg".to_string())));
        assert_eq!(parse_question_file("cover.png"), None);
        assert_eq!(parse_question_file("5"), None);
        assert_eq!(parse_question_file("5."), None);
    }

    #[test]
    fn test_youtube_start_seconds() {
        assert_eq!(youtube_start_seconds("https://youtu.be/abc?t=95"), 95);
        assert_eq!(
            youtube_start_seconds("https://www.youtube.com/watch?v=abc&start=30"),
            30
        );
        assert_eq!(youtube_start_seconds("https://youtu.be/abc"), 0);
        assert_eq!(youtube_start_seconds(""), 0);
    }

    #[test]
    fn test_is_valid_video_url() {
        assert!(is_valid_video_url("https://youtu.be/abc"));
        assert!(is_valid_video_url("http://example.com/v"));
        assert!(is_valid_video_url(""));
        assert!(!is_valid_video_url("ftp://example.com/v"));
        assert!(!is_valid_video_url("youtu.be/abc"));
    }
}
