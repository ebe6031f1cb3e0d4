// Helper functions for safe logging and display formatting

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// use monynha_fun::common::safe_email_log;
/// assert_eq!(safe_email_log("user@example.com"), "u***@example.com");
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 && !parts[0].is_empty() {
            let first: String = parts[0].chars().take(1).collect();
            format!("{}***@{}", first, parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Formats an integer with pt-BR digit grouping (`1234567` -> `1.234.567`)
pub fn format_count_pt_br(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Uppercased first character of a display name, used as avatar fallback
pub fn initial_of(name: &str) -> Option<char> {
    name.trim()
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("user@example.com"), "u***@example.com");
        assert_eq!(safe_email_log("a@b"), "***@***.***");
        assert_eq!(safe_email_log("not-an-email"), "***@***.***");
    }

    #[test]
    fn test_format_count_pt_br() {
        assert_eq!(format_count_pt_br(0), "0");
        assert_eq!(format_count_pt_br(999), "999");
        assert_eq!(format_count_pt_br(1000), "1.000");
        assert_eq!(format_count_pt_br(1234567), "1.234.567");
        assert_eq!(format_count_pt_br(-45210), "-45.210");
    }

    #[test]
    fn test_initial_of() {
        assert_eq!(initial_of("maria"), Some('M'));
        assert_eq!(initial_of("  élodie"), Some('É'));
        assert_eq!(initial_of("   "), None);
    }
}
