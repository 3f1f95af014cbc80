//! SAML bindings implementation.
//!
//! This module implements the SAML 2.0 bindings for message transport:
//!
//! - **HTTP-POST Binding** - Messages are base64-encoded and sent in HTML forms
//! - **HTTP-Redirect Binding** - Messages are deflated, base64-encoded, and URL-encoded
//! - **SOAP Binding** - Messages are wrapped in a SOAP 1.1 envelope
//!
//! Encoders are pure functions returning an [`EncodedPayload`]: the headers
//! and body of the HTTP message that carries the protocol message.
//!
//! # Usage
//!
//! ```rust,ignore
//! use kc_saml_binding::bindings::{encode_post, encode_redirect, SamlMessageType};
//! use kc_saml_binding::message::ProtocolMessage;
//!
//! let form = encode_post(ProtocolMessage::structured(&request), "https://idp.example.com/sso", "rs", SamlMessageType::Request);
//! let redirect = encode_redirect(ProtocolMessage::structured(&request), "https://idp.example.com/sso", "", SamlMessageType::Request)?;
//! ```

pub mod codec;
mod post;
mod redirect;
mod soap;

pub use post::*;
pub use redirect::*;
pub use soap::*;

use crate::error::{SamlError, SamlResult};
use crate::message::ProtocolMessage;
use crate::types::SamlBinding;

/// SAML message type for binding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamlMessageType {
    /// Request message.
    #[default]
    Request,
    /// Response message.
    Response,
}

impl SamlMessageType {
    /// Returns the form parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}

/// Decoded SAML binding message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// The decoded XML message.
    pub xml: String,
    /// The message type (request or response).
    pub message_type: SamlMessageType,
    /// The RelayState if present.
    pub relay_state: Option<String>,
}

/// Headers and body produced by a binding encoder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedPayload {
    /// Header name and value pairs, in order.
    pub headers: Vec<(String, String)>,
    /// The HTTP body; empty for the Redirect binding.
    pub body: String,
}

impl EncodedPayload {
    /// Returns the first header with the given name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the redirect target of a Redirect binding payload.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("Location")
    }
}

/// Encodes `message` with the chosen binding.
///
/// SOAP and PAOS produce an envelope without header parts; use
/// [`encode_soap_payload`] to attach some.
pub fn pack(
    binding: SamlBinding,
    message: ProtocolMessage<'_>,
    destination: &str,
    relay_state: &str,
    message_type: SamlMessageType,
) -> SamlResult<EncodedPayload> {
    match binding {
        SamlBinding::HttpPost => Ok(encode_post(message, destination, relay_state, message_type)),
        SamlBinding::HttpRedirect => {
            encode_redirect(message, destination, relay_state, message_type)
        }
        SamlBinding::Soap | SamlBinding::Paos => encode_soap_payload(message, &[]),
        SamlBinding::HttpArtifact => Err(SamlError::UnsupportedBinding(
            binding.uri().to_string(),
        )),
    }
}
