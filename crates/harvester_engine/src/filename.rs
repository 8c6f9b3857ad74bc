use chrono::NaiveDateTime;

/// `{username}_{label}_{YYYYMMDD_HHMMSS}.json`, with the username made filesystem-safe.
pub fn list_filename(username: &str, label: &str, at: NaiveDateTime) -> String {
    format!(
        "{}_{}_{}.json",
        sanitize_component(username),
        sanitize_component(label),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Replaces only characters no filesystem accepts; handle punctuation is kept.
fn sanitize_component(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap()
    }

    #[test]
    fn follows_username_label_timestamp_layout() {
        assert_eq!(
            list_filename("jane.doe", "followers", at()),
            "jane.doe_followers_20240309_070501.json"
        );
    }

    #[test]
    fn handle_punctuation_is_kept_verbatim() {
        assert_eq!(
            list_filename("_jane__doe_", "following", at()),
            "_jane__doe__following_20240309_070501.json"
        );
        assert_eq!(
            list_filename(".dotted.", "followers", at()),
            ".dotted._followers_20240309_070501.json"
        );
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(
            list_filename("we:ird/name", "following", at()),
            "we_ird_name_following_20240309_070501.json"
        );
        assert_eq!(
            list_filename("   ", "following", at()),
            "unknown_following_20240309_070501.json"
        );
    }
}
