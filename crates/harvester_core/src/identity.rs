use url::Url;

/// Maximum handle length accepted by the target site.
pub const MAX_IDENTIFIER_LEN: usize = 30;

/// Single path segments that share the shape of a profile link but point at
/// navigation, marketing or legal pages.
const RESERVED_SEGMENTS: &[&str] = &[
    "explore", "p", "reels", "stories", "direct", "tags", "about", "accounts", "legal",
    "directory", "hashtag", "login", "signup", "download", "help", "privacy", "terms", "api",
    "press", "jobs", "locations",
];

/// Link paths that never lead to a profile (posts, reels, tag pages, ...).
const OFF_TARGET_PATHS: &[&str] = &["/p/", "/explore/", "/reels/", "/stories/", "/direct/", "/tags/"];

/// Lowercase and drop everything that is not an ASCII letter or digit.
pub fn canonicalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Semantic filter: rejects reserved tokens and anything that cannot be a handle.
pub fn is_valid_identifier(raw: &str) -> bool {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return false;
    }
    if is_reserved(candidate) {
        return false;
    }
    if candidate.starts_with('@') || candidate.starts_with("p/") {
        return false;
    }
    if candidate
        .chars()
        .any(|c| matches!(c, '?' | '#' | '/') || c.is_whitespace())
    {
        return false;
    }
    let len = candidate.chars().count();
    len > 1 && len <= MAX_IDENTIFIER_LEN
}

/// Structural filter: pulls the profile segment out of a link target.
///
/// Query string, fragment and trailing slashes are dropped; links into
/// off-target sections, or below any reserved segment, yield `None`. Absolute URLs contribute only their path.
pub fn extract_identifier(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let path = match Url::parse(href) {
        Ok(url) if url.has_host() => url.path().to_string(),
        Ok(_) => return None,
        Err(_) => href.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let path = path.trim_end_matches('/');

    let probe = format!("{path}/");
    if OFF_TARGET_PATHS.iter().any(|off| probe.contains(off)) {
        return None;
    }

    let mut segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    let handle = segments.pop()?;
    if segments.iter().any(|segment| is_reserved(segment)) {
        return None;
    }
    Some(handle.to_string())
}

fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_hrefs_keep_last_segment() {
        assert_eq!(extract_identifier("/alice/"), Some("alice".to_string()));
        assert_eq!(extract_identifier("/bob?igsh=1"), Some("bob".to_string()));
        assert_eq!(extract_identifier("carol#top"), Some("carol".to_string()));
    }

    #[test]
    fn bare_host_yields_nothing() {
        assert_eq!(extract_identifier("https://www.example.com/"), None);
        assert_eq!(extract_identifier("mailto:someone@example.com"), None);
    }

    #[test]
    fn reserved_parent_segment_rejects_the_link() {
        assert_eq!(extract_identifier("/Directory/hashtags/"), None);
        assert_eq!(extract_identifier("https://www.example.com/help/center"), None);
        assert_eq!(extract_identifier("/alice/tagged/"), Some("tagged".to_string()));
    }

    #[test]
    fn off_target_paths_are_rejected_even_without_trailing_slash() {
        assert_eq!(extract_identifier("https://www.example.com/p/Cx12ab/"), None);
        assert_eq!(extract_identifier("/explore"), None);
    }
}
