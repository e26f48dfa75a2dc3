//! Share-token generation.
//!
//! A token is `<random alphanumeric prefix>/<sanitized filename>`. The
//! filename suffix keeps downloaded files recognizable; uniqueness rides
//! entirely on the random prefix plus the store's conditional write.

use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};

/// Generate a random alphanumeric token prefix of `len` characters.
pub fn generate_prefix(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Build a full token from a prefix and the shared target's name.
pub fn build_token(prefix: &str, filename: &str) -> String {
    format!("{prefix}/{}", sanitize_filename(filename))
}

/// Keep the filename URL- and key-safe: alphanumerics, dot, dash and
/// underscore pass through, everything else becomes an underscore.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_length_and_charset() {
        let p = generate_prefix(12);
        assert_eq!(p.len(), 12);
        assert!(p.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_token_keeps_filename_suffix() {
        let token = build_token("aB3dE5fG7hJ9", "report.pdf");
        assert!(token.ends_with("/report.pdf"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_filename("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_filename("a/b"), "a_b");
        assert_eq!(sanitize_filename(""), "file");
    }
}
