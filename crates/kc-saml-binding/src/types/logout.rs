//! SAML Logout types.
//!
//! Single Logout (SLO) request and response messages. Both are the usual
//! payloads of the SOAP back channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_instant, new_message_id, now, parse_instant, NameId, Status, SAMLP_NS, SAML_NS};
use crate::error::{SamlError, SamlResult};
use crate::message::{
    expect_tag, required_attribute, required_child_text, FromElement, SamlMessage, ToElement,
};
use crate::xml::Element;

/// SAML Logout Request.
///
/// A request to terminate an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the requester.
    pub issuer: String,

    /// The URL where this request was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The name identifier of the principal to log out.
    pub name_id: NameId,

    /// Session indexes to terminate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_indexes: Vec<String>,

    /// Reason for the logout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Time after which the request is no longer valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,
}

fn default_version() -> String {
    "2.0".to_string()
}

impl LogoutRequest {
    /// User logout reason.
    pub const REASON_USER: &'static str = "urn:oasis:names:tc:SAML:2.0:logout:user";

    /// Admin logout reason.
    pub const REASON_ADMIN: &'static str = "urn:oasis:names:tc:SAML:2.0:logout:admin";

    /// Creates a new logout request.
    #[must_use]
    pub fn new(issuer: impl Into<String>, name_id: NameId) -> Self {
        Self {
            id: new_message_id(),
            version: default_version(),
            issue_instant: now(),
            issuer: issuer.into(),
            destination: None,
            name_id,
            session_indexes: Vec::new(),
            reason: None,
            not_on_or_after: None,
        }
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Adds a session index to terminate.
    #[must_use]
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_indexes.push(index.into());
        self
    }

    /// Sets the logout reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the validity period.
    #[must_use]
    pub fn valid_for(mut self, minutes: i64) -> Self {
        self.not_on_or_after = Some(self.issue_instant + chrono::Duration::minutes(minutes));
        self
    }

    /// Checks if the request has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.not_on_or_after
            .is_some_and(|not_after| Utc::now() >= not_after)
    }
}

impl ToElement for LogoutRequest {
    fn to_element(&self) -> Element {
        let mut element = Element::ns(SAMLP_NS, Self::TAG)
            .with_attribute("ID", self.id.clone())
            .with_attribute("Version", self.version.clone())
            .with_attribute("IssueInstant", format_instant(&self.issue_instant))
            .with_optional_attribute("Destination", self.destination.as_deref())
            .with_optional_attribute("Reason", self.reason.as_deref());
        if let Some(not_after) = &self.not_on_or_after {
            element = element.with_attribute("NotOnOrAfter", format_instant(not_after));
        }

        element = element
            .with_child(Element::ns(SAML_NS, "Issuer").with_text(self.issuer.clone()))
            .with_child(self.name_id.to_element());
        for index in &self.session_indexes {
            element.append(Element::ns(SAMLP_NS, "SessionIndex").with_text(index.clone()));
        }
        element
    }
}

impl FromElement for LogoutRequest {
    const NAMESPACE: &'static str = SAMLP_NS;
    const TAG: &'static str = "LogoutRequest";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        let name_id = element
            .find(SAML_NS, NameId::TAG)
            .ok_or_else(|| SamlError::MissingElement("NameID".to_string()))?;

        Ok(Self {
            id: required_attribute(element, "ID")?.to_string(),
            version: required_attribute(element, "Version")?.to_string(),
            issue_instant: parse_instant(required_attribute(element, "IssueInstant")?)?,
            issuer: required_child_text(element, SAML_NS, "Issuer")?,
            destination: element.attribute("Destination").map(String::from),
            name_id: NameId::from_element(name_id)?,
            session_indexes: element
                .find_all(SAMLP_NS, "SessionIndex")
                .map(Element::text)
                .collect(),
            reason: element.attribute("Reason").map(String::from),
            not_on_or_after: element
                .attribute("NotOnOrAfter")
                .map(parse_instant)
                .transpose()?,
        })
    }
}

impl SamlMessage for LogoutRequest {
    fn type_name(&self) -> &'static str {
        Self::TAG
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// SAML Logout Response.
///
/// A response to a logout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Unique identifier for this response.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Timestamp when this response was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the responder.
    pub issuer: String,

    /// The ID of the request this response is for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// The URL where this response was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The status of the response.
    pub status: Status,
}

impl LogoutResponse {
    /// Creates a new logout response carrying `status`.
    #[must_use]
    pub fn new(issuer: impl Into<String>, status: Status) -> Self {
        Self {
            id: new_message_id(),
            version: default_version(),
            issue_instant: now(),
            issuer: issuer.into(),
            in_response_to: None,
            destination: None,
            status,
        }
    }

    /// Creates a new success logout response.
    #[must_use]
    pub fn success(issuer: impl Into<String>) -> Self {
        Self::new(issuer, Status::success())
    }

    /// Sets the request ID this response is for.
    #[must_use]
    pub fn in_response_to(mut self, request_id: impl Into<String>) -> Self {
        self.in_response_to = Some(request_id.into());
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Returns true if this response indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl ToElement for LogoutResponse {
    fn to_element(&self) -> Element {
        Element::ns(SAMLP_NS, Self::TAG)
            .with_attribute("ID", self.id.clone())
            .with_attribute("Version", self.version.clone())
            .with_attribute("IssueInstant", format_instant(&self.issue_instant))
            .with_optional_attribute("InResponseTo", self.in_response_to.as_deref())
            .with_optional_attribute("Destination", self.destination.as_deref())
            .with_child(Element::ns(SAML_NS, "Issuer").with_text(self.issuer.clone()))
            .with_child(self.status.to_element())
    }
}

impl FromElement for LogoutResponse {
    const NAMESPACE: &'static str = SAMLP_NS;
    const TAG: &'static str = "LogoutResponse";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        let status = element
            .find(SAMLP_NS, Status::TAG)
            .ok_or_else(|| SamlError::MissingElement("Status".to_string()))?;

        Ok(Self {
            id: required_attribute(element, "ID")?.to_string(),
            version: required_attribute(element, "Version")?.to_string(),
            issue_instant: parse_instant(required_attribute(element, "IssueInstant")?)?,
            issuer: required_child_text(element, SAML_NS, "Issuer")?,
            in_response_to: element.attribute("InResponseTo").map(String::from),
            destination: element.attribute("Destination").map(String::from),
            status: Status::from_element(status)?,
        })
    }
}

impl SamlMessage for LogoutResponse {
    fn type_name(&self) -> &'static str {
        Self::TAG
    }

    fn id(&self) -> &str {
        &self.id
    }
}
