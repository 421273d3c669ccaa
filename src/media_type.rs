//! `Content-Type` header parsing.
//!
//! A hypermedia server may attach a `profile` parameter to its content type:
//!
//! ```text
//! Content-Type: application/json; profile="http://example.com/profile"
//! ```
//!
//! The profile names a URI describing the semantic schema of the
//! representation and is surfaced by the context as an implicit `profile`
//! link relation. This module extracts the media-type essence and parameters
//! independent of quoting style and parameter ordering. Parsing never fails:
//! a malformed parameter section simply yields no parameters, because a
//! missing profile is not an error condition.

use std::collections::BTreeMap;

/// A parsed media type: essence (`type/subtype`) plus parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaType {
    /// Lowercased `type/subtype`, e.g. `application/json`.
    pub essence: String,
    /// Parameters with lowercased names. Values keep their original case.
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parse a raw `Content-Type` header value.
    pub fn parse(value: &str) -> MediaType {
        let value = value.trim();
        let (essence, rest) = match value.find(';') {
            Some(idx) => (&value[..idx], &value[idx + 1..]),
            None => (value, ""),
        };

        MediaType {
            essence: essence.trim().to_ascii_lowercase(),
            params: parse_params(rest),
        }
    }

    /// The `profile` parameter value, if present.
    #[inline]
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.param("profile")
    }

    /// Look up a parameter by case-insensitive name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Parse the `; name=value` parameter section of a media type.
///
/// Values may be bare tokens or double-quoted strings with `\`-escapes.
/// Parameters that do not fit `name=value` are skipped.
fn parse_params(input: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    let mut chars = input.chars().peekable();

    loop {
        // Parameter name, up to '='.
        let mut name = String::new();
        let mut found_eq = false;
        for c in chars.by_ref() {
            match c {
                '=' => {
                    found_eq = true;
                    break;
                }
                ';' => {
                    // Valueless segment, start over with the next one.
                    name.clear();
                    continue;
                }
                _ => name.push(c),
            }
        }
        if !found_eq {
            break;
        }
        let name = name.trim().to_ascii_lowercase();

        // Parameter value: quoted string or bare token.
        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut escaped = false;
            for c in chars.by_ref() {
                if escaped {
                    value.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    break;
                } else {
                    value.push(c);
                }
            }
            // Skip everything up to the next separator.
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            value = value.trim().to_string();
        }

        if !name.is_empty() {
            params.insert(name, value);
        }
    }

    params
}
