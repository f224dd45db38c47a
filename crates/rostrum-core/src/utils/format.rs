/// Normalize a phone number to (XXX) XXX-XXXX.
/// Anything that is not a 10-digit number (or 11 with a leading 1) is
/// returned unchanged.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => format!(
            "({}) {}-{}",
            &digits[0..3],
            &digits[3..6],
            &digits[6..10]
        ),
        11 if digits.starts_with('1') => format!(
            "({}) {}-{}",
            &digits[1..4],
            &digits[4..7],
            &digits[7..11]
        ),
        _ => phone.to_string(),
    }
}

/// Truncate a string to at most `max_len` characters, adding an ellipsis
/// when something was cut.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
