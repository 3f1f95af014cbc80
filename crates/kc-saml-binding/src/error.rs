//! SAML binding error types.
//!
//! Covers wire encoding and decoding, SOAP envelope structure, cookie
//! ingestion, signing, and HTTP transport failures.

use thiserror::Error;

use crate::types::status_codes;

/// Result type for SAML binding operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML binding errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Invalid SAML request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// The document is not a well-formed SOAP envelope.
    #[error("malformed SOAP envelope: {0}")]
    MalformedEnvelope(String),

    /// The SOAP body does not hold the expected message type.
    #[error("wrong body type in SOAP envelope: {0}")]
    UnexpectedBodyType(String),

    /// The SOAP envelope carries a header where none was expected.
    #[error("unexpected SOAP header: {0}")]
    UnexpectedHeader(String),

    /// A cookie expiry did not match any accepted date pattern.
    #[error("unparseable cookie date: {0}")]
    DateFormat(String),

    /// Signing the outbound envelope failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The HTTP transport could not complete the exchange.
    #[error("connection error: {0}")]
    Connection(String),

    /// Unknown or unsupported binding.
    #[error("unsupported binding: {0}")]
    UnsupportedBinding(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Deflate compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// Transport configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SamlError {
    /// Returns the SAML status code a responder would report for this error.
    #[must_use]
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_)
            | Self::MissingElement(_)
            | Self::XmlParse(_)
            | Self::MalformedEnvelope(_)
            | Self::UnexpectedBodyType(_)
            | Self::UnexpectedHeader(_)
            | Self::Base64Decode(_)
            | Self::Deflate(_) => status_codes::REQUESTER,
            Self::UnsupportedBinding(_) => status_codes::REQUEST_UNSUPPORTED,
            _ => status_codes::RESPONDER,
        }
    }

    /// Returns true if the error was raised by the transport rather than by
    /// the content of a message.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SamlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::Deflate(err.to_string())
    }
}
