//! ECP and PAOS SOAP header parts.
//!
//! The reverse-SOAP profile carries routing information in the envelope
//! header rather than in the message itself.

use serde::{Deserialize, Serialize};

use super::{ECP_NS, PAOS_NS, SOAP_ENV_NS};
use crate::error::SamlResult;
use crate::message::{expect_tag, required_attribute, FromElement, ToElement};
use crate::xml::{Element, QName};

/// Actor URI for header blocks targeted at the next SOAP node.
pub const SOAP_ACTOR_NEXT: &str = "http://schemas.xmlsoap.org/soap/actor/next";

/// PAOS service URI for the SAML 2.0 ECP profile.
pub const ECP_SERVICE: &str = "urn:oasis:names:tc:SAML:2.0:profiles:SSO:ecp";

fn soap_attribute(local: &str) -> QName {
    QName::new(SOAP_ENV_NS, local)
}

fn header_block(namespace: &str, tag: &str, must_understand: bool, actor: &str) -> Element {
    let mut element = Element::ns(namespace, tag);
    element.set_attribute(
        soap_attribute("mustUnderstand"),
        if must_understand { "1" } else { "0" },
    );
    element.set_attribute(soap_attribute("actor"), actor);
    element
}

fn must_understand(element: &Element) -> bool {
    matches!(
        element.attribute_ns(SOAP_ENV_NS, "mustUnderstand"),
        Some("1" | "true")
    )
}

/// ECP `RelayState` header block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcpRelayState {
    /// The relay state value.
    pub value: String,

    /// Whether the receiver must process the block.
    pub must_understand: bool,

    /// The SOAP actor the block is addressed to.
    pub actor: String,
}

impl EcpRelayState {
    /// Creates a relay state block addressed to the next SOAP node.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            must_understand: true,
            actor: SOAP_ACTOR_NEXT.to_string(),
        }
    }
}

impl ToElement for EcpRelayState {
    fn to_element(&self) -> Element {
        header_block(ECP_NS, Self::TAG, self.must_understand, &self.actor)
            .with_text(self.value.clone())
    }
}

impl FromElement for EcpRelayState {
    const NAMESPACE: &'static str = ECP_NS;
    const TAG: &'static str = "RelayState";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        Ok(Self {
            value: element.text(),
            must_understand: must_understand(element),
            actor: element
                .attribute_ns(SOAP_ENV_NS, "actor")
                .unwrap_or(SOAP_ACTOR_NEXT)
                .to_string(),
        })
    }
}

/// PAOS `Request` header block.
///
/// Tells the enhanced client where to deliver the response to the enclosed
/// authentication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaosRequest {
    /// Where the enhanced client should send the response.
    pub response_consumer_url: String,

    /// The PAOS service being offered.
    pub service: String,

    /// Optional message ID for correlating the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl PaosRequest {
    /// Creates a PAOS request for the ECP service.
    #[must_use]
    pub fn new(response_consumer_url: impl Into<String>) -> Self {
        Self {
            response_consumer_url: response_consumer_url.into(),
            service: ECP_SERVICE.to_string(),
            message_id: None,
        }
    }

    /// Sets the correlation message ID.
    #[must_use]
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }
}

impl ToElement for PaosRequest {
    fn to_element(&self) -> Element {
        header_block(PAOS_NS, Self::TAG, true, SOAP_ACTOR_NEXT)
            .with_attribute("responseConsumerURL", self.response_consumer_url.clone())
            .with_attribute("service", self.service.clone())
            .with_optional_attribute("messageID", self.message_id.as_deref())
    }
}

impl FromElement for PaosRequest {
    const NAMESPACE: &'static str = PAOS_NS;
    const TAG: &'static str = "Request";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        Ok(Self {
            response_consumer_url: required_attribute(element, "responseConsumerURL")?
                .to_string(),
            service: required_attribute(element, "service")?.to_string(),
            message_id: element.attribute("messageID").map(String::from),
        })
    }
}

/// Any header part of the ECP profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcpHeader {
    /// A `paos:Request` block.
    Paos(PaosRequest),
    /// An `ecp:RelayState` block.
    RelayState(EcpRelayState),
}

impl From<PaosRequest> for EcpHeader {
    fn from(request: PaosRequest) -> Self {
        Self::Paos(request)
    }
}

impl From<EcpRelayState> for EcpHeader {
    fn from(relay_state: EcpRelayState) -> Self {
        Self::RelayState(relay_state)
    }
}

impl ToElement for EcpHeader {
    fn to_element(&self) -> Element {
        match self {
            Self::Paos(request) => request.to_element(),
            Self::RelayState(relay_state) => relay_state.to_element(),
        }
    }
}
