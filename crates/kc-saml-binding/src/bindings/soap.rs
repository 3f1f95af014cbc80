//! SOAP binding implementation.
//!
//! Builds SOAP 1.1 envelopes around protocol messages and reads them back.
//!
//! A message that is already serialized is spliced into the envelope text
//! instead of being parsed and written again: any signature computed over the
//! original bytes stays valid. The envelope is serialized around a
//! placeholder element in a private namespace, the namespace declaration is
//! cut out, and the placeholder is replaced by the message text.

use std::convert::Infallible;

use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::message::{FromElement, ProtocolMessage, ToElement};
use crate::types::SOAP_ENV_NS;
use crate::xml::{Element, QName};

use super::EncodedPayload;

/// Namespace of the placeholder element used while splicing.
const SPLICE_NAMESPACE: &str = "urn:x-kc-saml-binding:splice-placeholder";

/// Local name of the placeholder element used while splicing.
const SPLICE_TAG: &str = "SplicedFragment";

/// Wraps `message` in a SOAP envelope.
///
/// `header_parts` become the children of `SOAP-ENV:Header`, in order; the
/// header is omitted when there are none.
pub fn encode_soap(
    message: ProtocolMessage<'_>,
    header_parts: &[&dyn ToElement],
) -> SamlResult<String> {
    let mut envelope = Element::ns(SOAP_ENV_NS, "Envelope");
    if !header_parts.is_empty() {
        let mut header = Element::ns(SOAP_ENV_NS, "Header");
        for part in header_parts {
            header.append(part.to_element());
        }
        envelope.append(header);
    }

    match message {
        ProtocolMessage::Structured(message) => {
            envelope.append(Element::ns(SOAP_ENV_NS, "Body").with_child(message.to_element()));
            Ok(envelope.to_xml())
        }
        ProtocolMessage::Raw(text) => splice(envelope, text),
    }
}

/// Encodes `message` as a SOAP request payload.
pub fn encode_soap_payload(
    message: ProtocolMessage<'_>,
    header_parts: &[&dyn ToElement],
) -> SamlResult<EncodedPayload> {
    Ok(EncodedPayload {
        headers: vec![(
            "Content-type".to_string(),
            "application/soap+xml".to_string(),
        )],
        body: encode_soap(message, header_parts)?,
    })
}

fn splice(mut envelope: Element, text: &str) -> SamlResult<String> {
    let fragment = strip_xml_declaration(text);
    if fragment.trim().is_empty() {
        return Err(SamlError::InvalidRequest(
            "cannot place an empty message in a SOAP body".to_string(),
        ));
    }

    envelope.append(
        Element::ns(SOAP_ENV_NS, "Body").with_child(Element::ns(SPLICE_NAMESPACE, SPLICE_TAG)),
    );
    let serialized = envelope.to_xml();

    let (document, prefix) = excise_namespace_declaration(&serialized, SPLICE_NAMESPACE)?;
    let placeholder = format!("<{prefix}:{SPLICE_TAG} />");
    if !document.contains(&placeholder) {
        return Err(SamlError::Internal(format!(
            "placeholder {placeholder} not found in serialized envelope"
        )));
    }
    Ok(document.replacen(&placeholder, fragment, 1))
}

/// Drops a leading XML declaration and the line break after it.
///
/// Whitespace and a byte order mark before the declaration are dropped with it.
fn strip_xml_declaration(text: &str) -> &str {
    let start = text.trim_start_matches(|c: char| c == '\u{feff}' || c.is_whitespace());
    if !start.starts_with("<?xml") {
        return text;
    }
    match start.find("?>") {
        Some(end) => start[end + 2..].trim_start_matches(['\r', '\n']),
        None => text,
    }
}

/// Removes the `xmlns:prefix="uri"` declaration of `uri` and returns the
/// remaining text together with the prefix the serializer chose.
fn excise_namespace_declaration(serialized: &str, uri: &str) -> SamlResult<(String, String)> {
    let value = format!("=\"{uri}\"");
    let missing = || SamlError::Internal(format!("no namespace declaration for {uri}"));

    let value_at = serialized.find(&value).ok_or_else(missing)?;
    let declaration_at = serialized[..value_at].rfind(" xmlns:").ok_or_else(missing)?;
    let prefix = &serialized[declaration_at + " xmlns:".len()..value_at];

    let mut document = String::with_capacity(serialized.len());
    document.push_str(&serialized[..declaration_at]);
    document.push_str(&serialized[value_at + value.len()..]);
    Ok((document, prefix.to_string()))
}

/// Builds a header part of type `H` from an element.
type HeaderConstructor<H> = fn(&Element) -> SamlResult<H>;

fn construct<T, H>(element: &Element) -> SamlResult<H>
where
    T: FromElement + Into<H>,
{
    T::from_element(element).map(Into::into)
}

/// Header part types accepted while decoding an envelope.
///
/// Each candidate is matched by its qualified name; the first match wins.
pub struct HeaderTypes<H> {
    candidates: Vec<(QName, HeaderConstructor<H>)>,
}

impl<H> HeaderTypes<H> {
    /// Creates an empty set of candidates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Accepts header parts of type `T`.
    #[must_use]
    pub fn with<T>(mut self) -> Self
    where
        T: FromElement + Into<H>,
    {
        let constructor: HeaderConstructor<H> = construct::<T, H>;
        self.candidates.push((T::qualified_name(), constructor));
        self
    }

    /// Returns true if no candidate types were registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn constructor_for(&self, name: &QName) -> Option<HeaderConstructor<H>> {
        self.candidates
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, constructor)| *constructor)
    }
}

impl<H> Default for HeaderTypes<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded header parts keyed by qualified name, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapHeaders<H> {
    entries: Vec<(QName, H)>,
}

impl<H> SoapHeaders<H> {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a part; a later part with the same name replaces the earlier one in place.
    pub fn insert(&mut self, name: QName, part: H) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = part,
            None => self.entries.push((name, part)),
        }
    }

    /// Returns the part with the given qualified name.
    #[must_use]
    pub fn get(&self, namespace: &str, local: &str) -> Option<&H> {
        self.entries
            .iter()
            .find(|(n, _)| n.is(namespace, local))
            .map(|(_, part)| part)
    }

    /// Iterates over the parts in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&QName, &H)> {
        self.entries.iter().map(|(n, part)| (n, part))
    }

    /// Number of decoded parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no header part was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H> Default for SoapHeaders<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded SOAP envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapEnvelope<B, H> {
    /// The message carried in the body.
    pub body: B,
    /// The decoded header parts.
    pub headers: SoapHeaders<H>,
}

/// Decodes a SOAP envelope whose body holds a `B`.
///
/// A `Header` is only accepted when `header_types` names at least one
/// candidate; header parts that match no candidate are skipped.
pub fn decode_soap<B, H>(
    text: &str,
    header_types: Option<&HeaderTypes<H>>,
) -> SamlResult<SoapEnvelope<B, H>>
where
    B: FromElement,
{
    if text.trim().is_empty() {
        return Err(SamlError::MalformedEnvelope("empty document".to_string()));
    }
    let root = Element::parse(text).map_err(|e| SamlError::MalformedEnvelope(e.to_string()))?;
    if !root.name.is(SOAP_ENV_NS, "Envelope") {
        return Err(SamlError::MalformedEnvelope(format!(
            "root element is {}, expected {{{SOAP_ENV_NS}}}Envelope",
            root.name
        )));
    }

    let body = envelope_child(&root, "Body")?
        .ok_or_else(|| SamlError::MalformedEnvelope("missing Body".to_string()))?;
    let header = envelope_child(&root, "Header")?;

    let mut contents = body.child_elements();
    let content = match (contents.next(), contents.next()) {
        (Some(content), None) => content,
        _ => {
            return Err(SamlError::MalformedEnvelope(
                "Body must hold exactly one element".to_string(),
            ))
        }
    };
    if !content.name.is(B::NAMESPACE, B::TAG) {
        return Err(SamlError::UnexpectedBodyType(format!(
            "expected {}, found {}",
            B::qualified_name(),
            content.name
        )));
    }
    let body = B::from_element(content)
        .map_err(|e| SamlError::UnexpectedBodyType(format!("{}: {e}", content.name)))?;

    let headers = match header {
        None => SoapHeaders::new(),
        Some(header) => {
            let types = header_types
                .filter(|types| !types.is_empty())
                .ok_or_else(|| {
                    SamlError::UnexpectedHeader("Header where none was expected".to_string())
                })?;
            decode_headers(header, types)?
        }
    };

    Ok(SoapEnvelope { body, headers })
}

/// Decodes an envelope that must not carry a header.
pub fn decode_soap_body<B>(text: &str) -> SamlResult<B>
where
    B: FromElement,
{
    decode_soap::<B, Infallible>(text, None).map(|envelope| envelope.body)
}

fn envelope_child<'e>(root: &'e Element, local: &str) -> SamlResult<Option<&'e Element>> {
    let mut found = root.find_all(SOAP_ENV_NS, local);
    match (found.next(), found.next()) {
        (_, Some(_)) => Err(SamlError::MalformedEnvelope(format!(
            "more than one {local} in envelope"
        ))),
        (first, None) => Ok(first),
    }
}

fn decode_headers<H>(header: &Element, types: &HeaderTypes<H>) -> SamlResult<SoapHeaders<H>> {
    let mut headers = SoapHeaders::new();
    for part in header.child_elements() {
        match types.constructor_for(&part.name) {
            Some(constructor) => {
                let value = constructor(part)
                    .map_err(|e| SamlError::UnexpectedHeader(format!("{}: {e}", part.name)))?;
                headers.insert(part.name.clone(), value);
            }
            None => debug!(tag = %part.name, "ignoring unrecognized SOAP header part"),
        }
    }
    Ok(headers)
}
