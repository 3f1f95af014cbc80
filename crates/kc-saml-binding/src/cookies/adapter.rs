//! Conversion between response cookie fields and the jar.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, warn};

use super::{CookieJar, CookieRecord, SetCookie};
use crate::error::{SamlError, SamlResult};

const FOUR_DIGIT_YEAR: &str = "%d-%b-%Y %H:%M:%S";
const TWO_DIGIT_YEAR: &str = "%d-%b-%y %H:%M:%S";

/// What ingesting one cookie did to the jar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieDisposition {
    /// The record was inserted or replaced.
    Stored,
    /// Any record with the same key was removed.
    Removed,
}

/// Converts a cookie date such as `Wed, 06-Jun-2012 01:34:34 GMT` into epoch
/// seconds (UTC).
///
/// The five-character weekday prefix and the trailing ` GMT` are dropped
/// before matching.
pub fn since_epoch(date: &str) -> SamlResult<i64> {
    let invalid = || SamlError::DateFormat(date.to_string());
    let stamp = date
        .get(5..date.len().saturating_sub(4))
        .ok_or_else(invalid)?;

    // %Y also accepts two digits, so only try it on a four-digit year.
    let year_digits = stamp
        .split(' ')
        .next()
        .and_then(|day| day.rsplit('-').next())
        .map_or(0, str::len);
    let long_form = (year_digits == 4)
        .then(|| NaiveDateTime::parse_from_str(stamp, FOUR_DIGIT_YEAR).ok())
        .flatten();

    long_form
        .or_else(|| NaiveDateTime::parse_from_str(stamp, TWO_DIGIT_YEAR).ok())
        .map(|instant| instant.and_utc().timestamp())
        .ok_or_else(invalid)
}

/// Resolved lifetime of an incoming cookie.
enum Lifetime {
    Session,
    Until(i64),
    Gone,
}

fn lifetime(cookie: &SetCookie, now: i64) -> SamlResult<Lifetime> {
    // Max-Age takes precedence; Expires is only read without it.
    let expires = match cookie.max_age.as_deref() {
        Some(max_age) => Some(match max_age.parse::<i64>() {
            Ok(seconds) if seconds <= 0 => return Ok(Lifetime::Gone),
            Ok(seconds) => now.saturating_add(seconds),
            Err(_) => since_epoch(max_age)?,
        }),
        None => cookie.expires.as_deref().map(since_epoch).transpose()?,
    };

    Ok(match expires {
        None => Lifetime::Session,
        Some(at) if at <= now => Lifetime::Gone,
        Some(at) => Lifetime::Until(at),
    })
}

/// Applies one parsed cookie to `jar` at time `now` (epoch seconds).
///
/// A zero or negative max-age, or an expiry in the past, removes the record
/// with the same domain, path and name instead of storing it.
pub fn ingest_cookie(
    jar: &mut CookieJar,
    cookie: SetCookie,
    now: i64,
) -> SamlResult<CookieDisposition> {
    let record = match lifetime(&cookie, now)? {
        Lifetime::Gone => {
            let key = CookieRecord::from_set_cookie(cookie, None).key();
            let removed = jar.remove(&key).is_some();
            debug!(cookie = %key.name, domain = %key.domain, path = %key.path, removed, "cookie expired");
            return Ok(CookieDisposition::Removed);
        }
        Lifetime::Session => CookieRecord::from_set_cookie(cookie, None),
        Lifetime::Until(at) => CookieRecord::from_set_cookie(cookie, Some(at)),
    };

    jar.insert(record);
    Ok(CookieDisposition::Stored)
}

/// Ingests `Set-Cookie` header fields into `jar`.
///
/// A field that cannot be parsed, or whose date is invalid, is dropped with a
/// warning; the remaining fields are still applied.
pub fn ingest<I, S>(jar: &mut CookieJar, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ingest_at(jar, fields, Utc::now().timestamp());
}

/// [`ingest`] with an explicit clock, in epoch seconds.
pub fn ingest_at<I, S>(jar: &mut CookieJar, fields: I, now: i64)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for field in fields {
        let Some(cookie) = SetCookie::parse(field.as_ref()) else {
            continue;
        };
        let name = cookie.name.clone();
        if let Err(err) = ingest_cookie(jar, cookie, now) {
            warn!(cookie = %name, error = %err, "dropping cookie");
        }
    }
}

/// Flattens the jar into a name to value mapping.
///
/// Cookies sharing a name across domains or paths collapse to the last one in
/// jar order.
#[must_use]
pub fn export(jar: &CookieJar) -> BTreeMap<String, String> {
    jar.iter()
        .map(|record| (record.name.clone(), record.value.clone()))
        .collect()
}

/// Renders the exported cookies as a `Cookie` header value.
#[must_use]
pub fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
