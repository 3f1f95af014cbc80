//! Canonical cookie records.

use serde::{Deserialize, Serialize};

use super::{CookieKey, SetCookie};

/// A cookie as kept in the jar.
///
/// The `*_specified` flags always mirror whether the paired value is
/// non-empty, and `domain_initial_dot` whether the domain starts with a dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    /// Cookie version; 0 unless the server sent one.
    pub version: u32,
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Port list, empty if unrestricted.
    pub port: String,
    /// Whether a port was given.
    pub port_specified: bool,
    /// Domain the cookie applies to.
    pub domain: String,
    /// Whether a domain was given.
    pub domain_specified: bool,
    /// Whether the domain starts with `.`.
    pub domain_initial_dot: bool,
    /// Path the cookie applies to.
    pub path: String,
    /// Whether a path was given.
    pub path_specified: bool,
    /// Send only over secure channels.
    pub secure: bool,
    /// Absolute expiry in epoch seconds; `None` for a session cookie.
    pub expires: Option<i64>,
    /// Drop at the end of the session.
    pub discard: bool,
    /// Comment attribute.
    pub comment: Option<String>,
    /// Comment URL attribute.
    pub comment_url: Option<String>,
    /// Unrecognized attributes, `; `-separated.
    pub rest: String,
    /// RFC 2109 compatibility.
    pub rfc2109: bool,
}

impl CookieRecord {
    /// Builds a record from a parsed header field and its resolved expiry.
    #[must_use]
    pub fn from_set_cookie(cookie: SetCookie, expires: Option<i64>) -> Self {
        let domain = cookie.domain.unwrap_or_default();
        let path = cookie.path.unwrap_or_default();
        let port = cookie.port.unwrap_or_default();

        Self {
            version: cookie
                .version
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            name: cookie.name,
            value: cookie.value,
            port_specified: !port.is_empty(),
            port,
            domain_specified: !domain.is_empty(),
            domain_initial_dot: domain.starts_with('.'),
            domain,
            path_specified: !path.is_empty(),
            path,
            secure: cookie.secure,
            expires,
            discard: expires.is_none() || cookie.discard,
            comment: cookie.comment,
            comment_url: cookie.comment_url,
            rest: cookie.extensions.join("; "),
            rfc2109: true,
        }
    }

    /// Jar key of this record.
    #[must_use]
    pub fn key(&self) -> CookieKey {
        CookieKey::new(&self.domain, &self.path, &self.name)
    }

    /// Returns true if the cookie lives only for the session.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        self.expires.is_none()
    }

    /// Returns true if the cookie has expired at `now` (epoch seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_mirror_values() {
        let cookie = SetCookie::parse("a=1; Domain=.example.com; Path=/; Version=1").unwrap();
        let record = CookieRecord::from_set_cookie(cookie, Some(2_000_000_000));

        assert!(record.domain_specified);
        assert!(record.domain_initial_dot);
        assert!(record.path_specified);
        assert!(!record.port_specified);
        assert_eq!(record.version, 1);
        assert!(!record.discard);
        assert!(!record.is_expired_at(1_000_000_000));
        assert!(record.is_expired_at(2_000_000_000));
    }

    #[test]
    fn session_cookie_defaults() {
        let cookie = SetCookie::parse("b=2; HttpOnly").unwrap();
        let record = CookieRecord::from_set_cookie(cookie, None);

        assert!(!record.domain_specified);
        assert!(!record.domain_initial_dot);
        assert!(!record.path_specified);
        assert!(record.is_session());
        assert!(record.discard);
        assert!(record.rfc2109);
        assert_eq!(record.version, 0);
        assert_eq!(record.rest, "HttpOnly");
        assert_eq!(record.key(), CookieKey::new("", "", "b"));
    }
}
