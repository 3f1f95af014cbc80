//! SAML AuthnRequest types.
//!
//! Authentication request message sent by a service provider to an identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    format_instant, new_message_id, now, parse_instant, NameIdPolicy, SamlBinding, SAMLP_NS,
    SAML_NS,
};
use crate::error::SamlResult;
use crate::message::{
    expect_tag, required_attribute, required_child_text, FromElement, SamlMessage, ToElement,
};
use crate::xml::Element;

/// SAML Authentication Request.
///
/// An authentication request message sent from a service provider to an
/// identity provider requesting authentication of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    pub version: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the service provider issuing the request.
    pub issuer: String,

    /// The URL where the response should be sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_consumer_service_url: Option<String>,

    /// The URL this request is sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Binding to use for the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_binding: Option<String>,

    /// Name ID policy constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_policy: Option<NameIdPolicy>,

    /// Whether the IdP must authenticate the user directly.
    #[serde(default)]
    pub force_authn: bool,

    /// Whether the IdP must not interact with the user.
    #[serde(default)]
    pub is_passive: bool,

    /// A human-readable name for the requester.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
}

impl AuthnRequest {
    /// Creates a new authentication request.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            version: "2.0".to_string(),
            issue_instant: now(),
            issuer: issuer.into(),
            assertion_consumer_service_url: None,
            destination: None,
            protocol_binding: None,
            name_id_policy: None,
            force_authn: false,
            is_passive: false,
            provider_name: None,
        }
    }

    /// Sets the assertion consumer service URL.
    #[must_use]
    pub fn with_acs_url(mut self, url: impl Into<String>) -> Self {
        self.assertion_consumer_service_url = Some(url.into());
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Sets the protocol binding for the response.
    #[must_use]
    pub fn with_binding(mut self, binding: SamlBinding) -> Self {
        self.protocol_binding = Some(binding.uri().to_string());
        self
    }

    /// Sets the name ID policy.
    #[must_use]
    pub fn with_name_id_policy(mut self, policy: NameIdPolicy) -> Self {
        self.name_id_policy = Some(policy);
        self
    }

    /// Sets force authentication.
    #[must_use]
    pub const fn force_authn(mut self, force: bool) -> Self {
        self.force_authn = force;
        self
    }

    /// Sets passive authentication.
    #[must_use]
    pub const fn is_passive(mut self, passive: bool) -> Self {
        self.is_passive = passive;
        self
    }

    /// Returns the parsed protocol binding.
    #[must_use]
    pub fn parsed_binding(&self) -> Option<SamlBinding> {
        self.protocol_binding.as_deref().and_then(SamlBinding::from_uri)
    }
}

impl ToElement for AuthnRequest {
    fn to_element(&self) -> Element {
        let mut element = Element::ns(SAMLP_NS, Self::TAG)
            .with_attribute("ID", self.id.clone())
            .with_attribute("Version", self.version.clone())
            .with_attribute("IssueInstant", format_instant(&self.issue_instant))
            .with_optional_attribute("Destination", self.destination.as_deref())
            .with_optional_attribute(
                "AssertionConsumerServiceURL",
                self.assertion_consumer_service_url.as_deref(),
            )
            .with_optional_attribute("ProtocolBinding", self.protocol_binding.as_deref())
            .with_optional_attribute("ProviderName", self.provider_name.as_deref());
        if self.force_authn {
            element = element.with_attribute("ForceAuthn", "true");
        }
        if self.is_passive {
            element = element.with_attribute("IsPassive", "true");
        }

        element = element.with_child(Element::ns(SAML_NS, "Issuer").with_text(self.issuer.clone()));
        if let Some(policy) = &self.name_id_policy {
            element.append(policy.to_element());
        }
        element
    }
}

impl FromElement for AuthnRequest {
    const NAMESPACE: &'static str = SAMLP_NS;
    const TAG: &'static str = "AuthnRequest";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        let flag = |name| matches!(element.attribute(name), Some("true" | "1"));

        Ok(Self {
            id: required_attribute(element, "ID")?.to_string(),
            version: required_attribute(element, "Version")?.to_string(),
            issue_instant: parse_instant(required_attribute(element, "IssueInstant")?)?,
            issuer: required_child_text(element, SAML_NS, "Issuer")?,
            assertion_consumer_service_url: element
                .attribute("AssertionConsumerServiceURL")
                .map(String::from),
            destination: element.attribute("Destination").map(String::from),
            protocol_binding: element.attribute("ProtocolBinding").map(String::from),
            name_id_policy: element
                .find(SAMLP_NS, NameIdPolicy::TAG)
                .map(NameIdPolicy::from_element)
                .transpose()?,
            force_authn: flag("ForceAuthn"),
            is_passive: flag("IsPassive"),
            provider_name: element.attribute("ProviderName").map(String::from),
        })
    }
}

impl SamlMessage for AuthnRequest {
    fn type_name(&self) -> &'static str {
        Self::TAG
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NameIdFormat;

    #[test]
    fn authn_request_creation() {
        let request = AuthnRequest::new("https://sp.example.com")
            .with_acs_url("https://sp.example.com/acs")
            .with_destination("https://idp.example.com/sso")
            .with_binding(SamlBinding::HttpPost)
            .force_authn(true);

        assert!(!request.id.is_empty());
        assert_eq!(request.version, "2.0");
        assert_eq!(
            request.assertion_consumer_service_url.as_deref(),
            Some("https://sp.example.com/acs")
        );
        assert!(request.force_authn);
        assert_eq!(request.parsed_binding(), Some(SamlBinding::HttpPost));
    }

    #[test]
    fn authn_request_element_roundtrip() {
        let request = AuthnRequest::new("https://sp.example.com")
            .with_acs_url("https://sp.example.com/acs")
            .with_binding(SamlBinding::Paos)
            .with_name_id_policy(NameIdPolicy::with_format(NameIdFormat::Persistent))
            .is_passive(true);

        let element = Element::parse(&request.to_xml()).unwrap();
        assert_eq!(element.attribute("IsPassive"), Some("true"));
        assert_eq!(element.attribute("ForceAuthn"), None);
        assert_eq!(AuthnRequest::from_element(&element).unwrap(), request);
    }

    #[test]
    fn authn_request_requires_issuer() {
        let element = Element::ns(SAMLP_NS, "AuthnRequest")
            .with_attribute("ID", "_a")
            .with_attribute("Version", "2.0")
            .with_attribute("IssueInstant", "2024-01-01T00:00:00Z");
        assert!(AuthnRequest::from_element(&element).is_err());
    }
}
