//! SAML 2.0 types and data structures.
//!
//! The protocol object model the bindings carry: authentication and logout
//! messages, name identifiers, status, and the ECP/PAOS SOAP header parts.

mod authn_request;
mod constants;
mod ecp;
mod logout;
mod name_id;
mod status;

pub use authn_request::*;
pub use constants::*;
pub use ecp::*;
pub use logout::*;
pub use name_id::*;
pub use status::*;

use chrono::{DateTime, SubsecRound, Utc};

use crate::error::{SamlError, SamlResult};

/// Generates a fresh message identifier.
pub(crate) fn new_message_id() -> String {
    format!("_id{}", uuid::Uuid::new_v4())
}

/// Current time truncated to whole seconds, the precision of `xs:dateTime` on the wire.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Formats an instant as an `xs:dateTime` in UTC.
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parses an `xs:dateTime` attribute value.
pub(crate) fn parse_instant(value: &str) -> SamlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| SamlError::XmlParse(format!("invalid instant {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instants_roundtrip() {
        let instant = now();
        assert_eq!(parse_instant(&format_instant(&instant)).unwrap(), instant);
    }

    #[test]
    fn instant_offsets_are_normalized() {
        let parsed = parse_instant("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(format_instant(&parsed), "2024-03-01T10:00:00Z");
        assert!(matches!(parse_instant("yesterday"), Err(SamlError::XmlParse(_))));
    }
}
