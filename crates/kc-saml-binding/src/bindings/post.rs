//! HTTP-POST Binding implementation.
//!
//! Implements the SAML 2.0 HTTP-POST binding for sending SAML messages
//! via an auto-submitting HTML form.

use crate::error::{SamlError, SamlResult};
use crate::message::ProtocolMessage;

use super::codec::{base64_decode, base64_encode};
use super::{DecodedMessage, EncodedPayload, SamlMessageType};

/// Encodes a message for the HTTP-POST binding.
///
/// The body is an HTML document whose single form posts the base64 message
/// and the relay state (possibly empty) to `destination` as soon as it loads.
#[must_use]
pub fn encode_post(
    message: ProtocolMessage<'_>,
    destination: &str,
    relay_state: &str,
    message_type: SamlMessageType,
) -> EncodedPayload {
    let encoded = base64_encode(&message.to_text());

    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>SAML 2.0 POST</title>
</head>
<body>
    <form method="post" action="{}">
        <input type="hidden" name="{}" value="{}" />
        <input type="hidden" name="RelayState" value="{}" />
        <noscript>
            <input type="submit" value="Submit" />
        </noscript>
    </form>
    <script type="text/javascript">
        window.onload = function () {{ document.forms[0].submit(); }}
    </script>
</body>
</html>"#,
        html_escape(destination),
        message_type.form_param(),
        encoded,
        html_escape(relay_state)
    );

    EncodedPayload {
        headers: vec![("Content-type".to_string(), "text/html".to_string())],
        body,
    }
}

/// Encodes a message as a plain XML POST body.
///
/// Used when answering over a back channel where no browser is involved.
#[must_use]
pub fn encode_xml_post(message: ProtocolMessage<'_>) -> EncodedPayload {
    EncodedPayload {
        headers: vec![("Content-type".to_string(), "text/xml".to_string())],
        body: message.to_text().into_owned(),
    }
}

/// Decodes a SAML message from HTTP-POST form data.
///
/// `value` is the base64 content of the `SAMLRequest` or `SAMLResponse` field.
pub fn decode_post(
    value: &str,
    message_type: SamlMessageType,
    relay_state: Option<&str>,
) -> SamlResult<DecodedMessage> {
    if value.trim().is_empty() {
        return Err(SamlError::InvalidRequest(format!(
            "empty {} parameter",
            message_type.form_param()
        )));
    }

    Ok(DecodedMessage {
        xml: base64_decode(value)?,
        message_type,
        relay_state: relay_state.filter(|rs| !rs.is_empty()).map(String::from),
    })
}

/// Escapes HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn field_value<'a>(html: &'a str, name: &str) -> &'a str {
        let marker = format!("name=\"{name}\" value=\"");
        let start = html.find(&marker).unwrap() + marker.len();
        let end = html[start..].find('"').unwrap();
        &html[start..start + end]
    }

    #[test]
    fn post_form_scenario() {
        let xml = r#"<samlp:AuthnRequest ID="_a1">test</samlp:AuthnRequest>"#;
        let payload = encode_post(
            ProtocolMessage::Raw(xml),
            "https://idp/sso",
            "RS1",
            SamlMessageType::Request,
        );

        assert_eq!(
            payload.headers,
            vec![("Content-type".to_string(), "text/html".to_string())]
        );
        assert!(payload.body.contains(r#"action="https://idp/sso""#));
        assert!(payload.body.contains(r#"<input type="hidden" name="RelayState" value="RS1" />"#));
        assert!(payload.body.contains("document.forms[0].submit()"));

        let encoded = field_value(&payload.body, "SAMLRequest");
        assert_eq!(
            encoded,
            base64::engine::general_purpose::STANDARD.encode(xml)
        );

        let decoded = decode_post(encoded, SamlMessageType::Request, Some("RS1")).unwrap();
        assert_eq!(decoded.xml, xml);
        assert_eq!(decoded.relay_state.as_deref(), Some("RS1"));
    }

    #[test]
    fn empty_relay_state_is_still_carried() {
        let payload = encode_post(
            ProtocolMessage::Raw("<samlp:Response/>"),
            "https://sp.example.com/acs",
            "",
            SamlMessageType::Response,
        );

        assert_eq!(field_value(&payload.body, "RelayState"), "");
        let encoded = field_value(&payload.body, "SAMLResponse");
        let decoded = decode_post(encoded, SamlMessageType::Response, Some("")).unwrap();
        assert_eq!(decoded.xml, "<samlp:Response/>");
        assert_eq!(decoded.relay_state, None);
    }

    #[test]
    fn form_attributes_are_escaped() {
        let payload = encode_post(
            ProtocolMessage::Raw("<x/>"),
            "https://idp.example.com/sso?a=1&b=\"2\"",
            "<script>",
            SamlMessageType::Request,
        );
        assert!(payload
            .body
            .contains(r#"action="https://idp.example.com/sso?a=1&amp;b=&quot;2&quot;""#));
        assert_eq!(field_value(&payload.body, "RelayState"), "&lt;script&gt;");
    }

    #[test]
    fn xml_post_carries_text_unchanged() {
        let xml = "<samlp:LogoutResponse ID=\"_r\"/>";
        let payload = encode_xml_post(ProtocolMessage::Raw(xml));
        assert_eq!(payload.header("content-type"), Some("text/xml"));
        assert_eq!(payload.body, xml);
    }

    #[test]
    fn decode_missing_message() {
        let result = decode_post("", SamlMessageType::Request, None);
        assert!(matches!(result, Err(SamlError::InvalidRequest(_))));
    }

    #[test]
    fn html_escape_special_chars() {
        let input = r#"<script>alert("xss")</script>"#;
        let escaped = html_escape(input);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('"'));
    }
}
