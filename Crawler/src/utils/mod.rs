//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape `text` for insertion into a Telegram message of `parse_mode`.
///
/// Unknown or empty modes are plain text and need no escaping.
pub fn escape_markup(parse_mode: &str, text: &str) -> String {
    let special: &[char] = match parse_mode.trim().to_ascii_lowercase().as_str() {
        "markdown" => &['_', '*', '`', '['],
        "markdownv2" => &[
            '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}',
            '.', '!',
        ],
        "html" => {
            return text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
        }
        _ => return text.to_string(),
    };

    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://academy.binance.com/es/learn-and-earn").unwrap();
        assert_eq!(
            resolve_url(&base, "/es/learn-and-earn/course/web3"),
            "https://academy.binance.com/es/learn-and-earn/course/web3"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup("Markdown", "snake_case *bold*"), "snake\\_case \\*bold\\*");
        assert_eq!(escape_markup("MarkdownV2", "v1.2 (beta)!"), "v1\\.2 \\(beta\\)\\!");
        assert_eq!(escape_markup("HTML", "<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
        assert_eq!(escape_markup("", "a_b"), "a_b");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Intro\n\t to   Web3 "), "Intro to Web3");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
