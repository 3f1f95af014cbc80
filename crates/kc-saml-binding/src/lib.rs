//! SAML 2.0 transport bindings for Keycloak Rust.
//!
//! This crate moves SAML protocol messages between parties:
//!
//! - **HTTP-POST binding** - Auto-submitting HTML forms carrying base64 messages
//! - **HTTP-Redirect binding** - DEFLATE-compressed messages in URL query strings
//! - **SOAP binding** - Envelope construction, splicing of pre-serialized
//!   messages, and typed envelope decoding with ECP/PAOS header parts
//! - **Cookie handling** - `Set-Cookie` ingestion and replay across requests
//! - **HTTP transport** - Cookie-aware sending and SOAP exchanges over `reqwest`
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`types`] - SAML protocol messages and constants
//! - [`xml`] - Namespace-aware element tree used to read and write messages
//! - [`message`] - Traits connecting messages to the element tree
//! - [`bindings`] - POST, Redirect and SOAP binding implementations
//! - [`cookies`] - Cookie parsing, normalization and the session jar
//! - [`transport`] - HTTP transport and SOAP request/response exchange
//! - [`error`] - Error types for SAML operations
//!
//! # Example
//!
//! ```rust,ignore
//! use kc_saml_binding::bindings::{pack, SamlMessageType};
//! use kc_saml_binding::message::ProtocolMessage;
//! use kc_saml_binding::{AuthnRequest, SamlBinding};
//!
//! let request = AuthnRequest::new("https://sp.example.com")
//!     .with_acs_url("https://sp.example.com/acs");
//! let payload = pack(
//!     SamlBinding::HttpRedirect,
//!     ProtocolMessage::structured(&request),
//!     "https://idp.example.com/sso",
//!     "state-1",
//!     SamlMessageType::Request,
//! )?;
//! let location = payload.location();
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [SAML 2.0 Profiles](https://docs.oasis-open.org/security/saml/v2.0/saml-profiles-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod cookies;
pub mod error;
pub mod message;
pub mod transport;
pub mod types;
pub mod xml;

pub use error::{SamlError, SamlResult};
pub use message::{FromElement, ProtocolMessage, SamlMessage, ToElement};
pub use transport::{Transport, TransportConfig};
pub use types::*;
