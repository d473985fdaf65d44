//! Utility functions and helpers.

pub mod html;
pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve against an optional base; without one the href is kept as-is.
pub fn resolve_opt(base: Option<&Url>, href: &str) -> String {
    match base {
        Some(base) => resolve_url(base, href),
        None => href.to_string(),
    }
}

/// Keep the first `max` characters, appending "..." when text was cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://obs.example.edu.tr/Birimler/Ogrenci/").unwrap();
        assert_eq!(
            resolve_url(&base, "Duyuru.aspx?id=4"),
            "https://obs.example.edu.tr/Birimler/Ogrenci/Duyuru.aspx?id=4"
        );
        assert_eq!(
            resolve_url(&base, "/root.aspx"),
            "https://obs.example.edu.tr/root.aspx"
        );
        assert_eq!(
            resolve_url(&base, "https://moodle.example.edu.tr/"),
            "https://moodle.example.edu.tr/"
        );
    }

    #[test]
    fn test_resolve_opt_without_base() {
        assert_eq!(resolve_opt(None, "a.aspx"), "a.aspx");
    }

    #[test]
    fn test_preview_counts_chars() {
        assert_eq!(preview("öğrenci", 3), "öğr...");
        assert_eq!(preview("kısa", 10), "kısa");
        assert_eq!(preview("abc", 3), "abc");
    }
}
