/// Reads an approximate list size out of profile text such as
/// `"1,234 following"`, `"987"` or `"1.2K followers"`.
///
/// Commas are thousands separators. A `K`/`M` suffix directly after the number
/// scales it. Returns `None` when the text has no digits.
pub fn parse_count_text(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];

    let mut number = String::new();
    let mut consumed = 0;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '0'..='9' => number.push(ch),
            ',' => {}
            '.' if !number.contains('.') => number.push('.'),
            _ => {
                consumed = idx;
                break;
            }
        }
        consumed = idx + ch.len_utf8();
    }

    let number = number.trim_end_matches('.');
    let value: f64 = number.parse().ok()?;
    let multiplier = match rest[consumed..].chars().next() {
        Some('k' | 'K') => 1_000.0,
        Some('m' | 'M') => 1_000_000.0,
        _ => 1.0,
    };
    Some((value * multiplier).round() as u64)
}
