//! HTTP-Redirect Binding implementation.
//!
//! Implements the SAML 2.0 HTTP-Redirect binding for sending SAML messages
//! via URL query parameters with DEFLATE compression.

use crate::error::{SamlError, SamlResult};
use crate::message::ProtocolMessage;

use super::codec::{decode_base64_and_inflate, deflate_and_base64_encode};
use super::{DecodedMessage, EncodedPayload, SamlMessageType};

/// Encodes a message for the HTTP-Redirect binding.
///
/// The payload has a single `Location` header and an empty body. The relay
/// state is only added to the query when it is non-empty.
pub fn encode_redirect(
    message: ProtocolMessage<'_>,
    destination: &str,
    relay_state: &str,
    message_type: SamlMessageType,
) -> SamlResult<EncodedPayload> {
    let encoded = deflate_and_base64_encode(&message.to_text())?;

    let mut query = format!(
        "{}={}",
        message_type.form_param(),
        urlencoding::encode(&encoded)
    );
    if !relay_state.is_empty() {
        query.push_str(&format!("&RelayState={}", urlencoding::encode(relay_state)));
    }

    let location = format!("{}{}{}", destination, query_glue(destination), query);
    Ok(EncodedPayload {
        headers: vec![("Location".to_string(), location)],
        body: String::new(),
    })
}

/// Separator between `destination` and the appended parameters.
fn query_glue(destination: &str) -> &'static str {
    match destination.split_once('?') {
        Some((_, "")) => "",
        Some(_) => "&",
        None => "?",
    }
}

/// Decodes a SAML message from an HTTP-Redirect query parameter.
///
/// `value` may still be percent-encoded; decoding is applied before base64.
pub fn decode_redirect(
    value: &str,
    message_type: SamlMessageType,
    relay_state: Option<&str>,
) -> SamlResult<DecodedMessage> {
    let url_decoded = urlencoding::decode(value)
        .map_err(|e| SamlError::InvalidRequest(format!("URL decode error: {e}")))?;
    inflate_message(&url_decoded, message_type, relay_state)
}

/// Decodes a message from a full redirect URL.
///
/// `SAMLRequest` takes precedence over `SAMLResponse`.
pub fn decode_redirect_url(url: &str) -> SamlResult<DecodedMessage> {
    let parsed = url::Url::parse(url)
        .map_err(|e| SamlError::InvalidRequest(format!("Invalid URL: {e}")))?;

    let mut saml_request = None;
    let mut saml_response = None;
    let mut relay_state = None;

    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "SAMLRequest" => saml_request = Some(value.into_owned()),
            "SAMLResponse" => saml_response = Some(value.into_owned()),
            "RelayState" => relay_state = Some(value.into_owned()),
            _ => {}
        }
    }

    let (encoded, message_type) = match (saml_request, saml_response) {
        (Some(req), _) => (req, SamlMessageType::Request),
        (None, Some(resp)) => (resp, SamlMessageType::Response),
        (None, None) => {
            return Err(SamlError::InvalidRequest(
                "No SAMLRequest or SAMLResponse parameter".to_string(),
            ))
        }
    };

    inflate_message(&encoded, message_type, relay_state.as_deref())
}

fn inflate_message(
    encoded: &str,
    message_type: SamlMessageType,
    relay_state: Option<&str>,
) -> SamlResult<DecodedMessage> {
    Ok(DecodedMessage {
        xml: decode_base64_and_inflate(encoded)?,
        message_type,
        relay_state: relay_state.filter(|rs| !rs.is_empty()).map(String::from),
    })
}
