//! Display formatting for sizes, durations and filenames.

/// Format a byte count as a human-readable label with binary units.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} TB", value)
}

/// Format a duration in seconds as `minutes:seconds` with zero-padded
/// seconds. Minutes are not folded into hours, so one hour reads "60:00".
pub fn format_duration(seconds: u32) -> String {
    if seconds == 0 {
        return "0:00".to_string();
    }
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Strip a title down to characters safe for a filename.
///
/// Keeps alphanumerics, spaces, underscores and hyphens; trailing
/// whitespace is trimmed.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1073741824), "1.0 GB");
        assert_eq!(format_size(1024u64.pow(4)), "1.0 TB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(75), "1:15");
        assert_eq!(format_duration(3600), "60:00");
        assert_eq!(format_duration(59), "0:59");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("Hello/World: Mix (2024)!"),
            "HelloWorld Mix 2024"
        );
        assert_eq!(sanitize_filename("plain_name-1"), "plain_name-1");
        assert_eq!(sanitize_filename("trailing   "), "trailing");
        assert_eq!(sanitize_filename("///"), "");
    }

    #[test]
    fn test_sanitize_keeps_unicode_alphanumerics() {
        assert_eq!(sanitize_filename("Børre på fjellet"), "Børre på fjellet");
    }
}
