//! `Set-Cookie` header field parsing.

use tracing::warn;

/// One parsed `Set-Cookie` header field.
///
/// Attribute names are matched case-insensitively. Attributes with an empty
/// value are treated as absent; unrecognized attributes are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value, without surrounding double quotes.
    pub value: String,
    /// Raw `Expires` attribute.
    pub expires: Option<String>,
    /// Raw `Max-Age` attribute.
    pub max_age: Option<String>,
    /// `Domain` attribute.
    pub domain: Option<String>,
    /// `Path` attribute.
    pub path: Option<String>,
    /// `Port` attribute.
    pub port: Option<String>,
    /// `Comment` attribute.
    pub comment: Option<String>,
    /// `CommentURL` attribute.
    pub comment_url: Option<String>,
    /// `Version` attribute.
    pub version: Option<String>,
    /// `Secure` flag.
    pub secure: bool,
    /// `Discard` flag.
    pub discard: bool,
    /// Unrecognized attributes such as `HttpOnly` or `SameSite=Lax`.
    pub extensions: Vec<String>,
}

impl SetCookie {
    /// Parses a single header field value.
    ///
    /// Returns `None` when the field has no `name=value` pair.
    #[must_use]
    pub fn parse(field: &str) -> Option<Self> {
        let mut segments = field.split(';');
        let first = segments.next().unwrap_or_default();

        let Some((name, value)) = first.split_once('=') else {
            warn!(field, "ignoring Set-Cookie field without name=value pair");
            return None;
        };
        let name = name.trim();
        if name.is_empty() {
            warn!(field, "ignoring Set-Cookie field with empty cookie name");
            return None;
        }

        let mut cookie = Self {
            name: name.to_string(),
            value: unquote(value.trim()).to_string(),
            ..Self::default()
        };

        for segment in segments.map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match segment.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (segment, ""),
            };
            let value = (!value.is_empty()).then(|| value.to_string());

            match key.to_ascii_lowercase().as_str() {
                "expires" => cookie.expires = value,
                "max-age" => cookie.max_age = value,
                "domain" => cookie.domain = value,
                "path" => cookie.path = value,
                "port" => cookie.port = value,
                "comment" => cookie.comment = value,
                "commenturl" => cookie.comment_url = value,
                "version" => cookie.version = value,
                "secure" => cookie.secure = true,
                "discard" => cookie.discard = true,
                _ => cookie.extensions.push(segment.to_string()),
            }
        }

        Some(cookie)
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
