//! Per-session cookie storage.

use std::collections::BTreeMap;

use super::CookieRecord;

/// Identity of a cookie in the jar.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CookieKey {
    /// Cookie domain.
    pub domain: String,
    /// Cookie path.
    pub path: String,
    /// Cookie name.
    pub name: String,
}

impl CookieKey {
    /// Creates a key.
    #[must_use]
    pub fn new(domain: &str, path: &str, name: &str) -> Self {
        Self {
            domain: domain.to_string(),
            path: path.to_string(),
            name: name.to_string(),
        }
    }
}

/// Cookie records of one session, keyed by `(domain, path, name)`.
///
/// Iteration follows key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<CookieKey, CookieRecord>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`, returning the record it replaced.
    pub fn insert(&mut self, record: CookieRecord) -> Option<CookieRecord> {
        self.cookies.insert(record.key(), record)
    }

    /// Removes the record stored under `key`, if any.
    pub fn remove(&mut self, key: &CookieKey) -> Option<CookieRecord> {
        self.cookies.remove(key)
    }

    /// Returns the record stored under `key`.
    #[must_use]
    pub fn get(&self, key: &CookieKey) -> Option<&CookieRecord> {
        self.cookies.get(key)
    }

    /// Iterates over the records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &CookieRecord> {
        self.cookies.values()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true if the jar holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.cookies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::SetCookie;

    fn record(field: &str) -> CookieRecord {
        CookieRecord::from_set_cookie(SetCookie::parse(field).unwrap(), None)
    }

    #[test]
    fn insert_replaces_same_key() {
        let mut jar = CookieJar::new();
        assert!(jar.insert(record("a=1; Domain=example.com; Path=/")).is_none());
        let replaced = jar.insert(record("a=2; Domain=example.com; Path=/")).unwrap();

        assert_eq!(replaced.value, "1");
        assert_eq!(jar.len(), 1);
        let key = CookieKey::new("example.com", "/", "a");
        assert_eq!(jar.get(&key).unwrap().value, "2");
    }

    #[test]
    fn distinct_paths_are_distinct_records() {
        let mut jar = CookieJar::new();
        jar.insert(record("a=1; Path=/x"));
        jar.insert(record("a=2; Path=/y"));
        assert_eq!(jar.len(), 2);

        assert!(jar.remove(&CookieKey::new("", "/x", "a")).is_some());
        assert!(jar.remove(&CookieKey::new("", "/x", "a")).is_none());
        jar.clear();
        assert!(jar.is_empty());
    }
}
