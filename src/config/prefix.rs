//! URL mount prefix normalization
//!
//! Converts the user-supplied prefix into a canonical absolute URL path that
//! starts and ends with `/`. Computed once at startup; the router rejects any
//! request path that does not begin with the result.

use std::fmt;

/// Raw prefix cannot form a valid URL path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixError {
    raw: String,
    offending: char,
}

impl fmt::Display for PrefixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid URL prefix {:?}: character {:?} cannot appear in a URL path",
            self.raw, self.offending
        )
    }
}

impl std::error::Error for PrefixError {}

/// Normalize a raw mount prefix into a canonical absolute path
///
/// Collapses repeated separators, resolves `.` and `..` segments against the
/// root (excess `..` clamps at the root, as URL resolution against a base
/// would), and forces leading and trailing slashes. Pure and deterministic:
/// `""` becomes `/`, `"foo"` becomes `/foo/`, `"../foo"` becomes `/foo/`.
pub fn normalize_prefix(raw: &str) -> Result<String, PrefixError> {
    if let Some(offending) = raw
        .chars()
        .find(|c| c.is_ascii_control() || c.is_whitespace() || *c == '?' || *c == '#')
    {
        return Err(PrefixError {
            raw: raw.to_string(),
            offending,
        });
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{}/", segments.join("/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        let cases = [
            ("/foo/", "/foo/"),
            ("/foo", "/foo/"),
            ("foo/", "/foo/"),
            ("foo", "/foo/"),
            ("foo/bar", "/foo/bar/"),
            ("../foo", "/foo/"),
            ("", "/"),
            ("///foo///bar", "/foo/bar/"),
            ("/foo/../bar", "/bar/"),
            ("/", "/"),
            ("/./foo/.", "/foo/"),
            ("../..", "/"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                normalize_prefix(input).unwrap(),
                expected,
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["", "foo", "../foo", "///foo///bar", "/foo/../bar"] {
            let once = normalize_prefix(raw).unwrap();
            assert_eq!(normalize_prefix(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert!(normalize_prefix("foo bar").is_err());
        assert!(normalize_prefix("foo?x=1").is_err());
        assert!(normalize_prefix("foo#frag").is_err());
        assert!(normalize_prefix("foo\nbar").is_err());
    }
}
