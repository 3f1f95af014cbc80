//! Protocol message seam.
//!
//! Bindings accept either a structured message, rendered through the element
//! tree, or a pre-serialized XML document carried verbatim. The choice is made
//! once, when the caller builds a [`ProtocolMessage`].

use std::borrow::Cow;

use crate::error::{SamlError, SamlResult};
use crate::xml::{Element, QName};

/// Renders a value as an XML element.
pub trait ToElement {
    /// Builds the element tree for this value.
    fn to_element(&self) -> Element;
}

/// Constructs a typed value from a parsed XML element.
pub trait FromElement: Sized {
    /// Namespace URI of the element.
    const NAMESPACE: &'static str;
    /// Local name of the element.
    const TAG: &'static str;

    /// Builds the value from `element`.
    fn from_element(element: &Element) -> SamlResult<Self>;

    /// Returns the qualified name this type is read from.
    #[must_use]
    fn qualified_name() -> QName {
        QName::new(Self::NAMESPACE, Self::TAG)
    }
}

/// A SAML protocol message that can be sent over a binding.
pub trait SamlMessage: ToElement + Sync {
    /// Name of the message type, as handed to a signer.
    fn type_name(&self) -> &'static str;

    /// The message `ID` attribute.
    fn id(&self) -> &str;

    /// Serializes the message as a standalone XML document.
    fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }
}

/// A message handed to a binding.
#[derive(Clone, Copy)]
pub enum ProtocolMessage<'a> {
    /// Pre-serialized XML, carried byte for byte.
    Raw(&'a str),
    /// A structured message rendered through the element tree.
    Structured(&'a dyn SamlMessage),
}

impl<'a> ProtocolMessage<'a> {
    /// Wraps a structured message.
    #[must_use]
    pub fn structured<M: SamlMessage>(message: &'a M) -> Self {
        Self::Structured(message)
    }

    /// Returns the textual form of the message.
    #[must_use]
    pub fn to_text(&self) -> Cow<'a, str> {
        match *self {
            Self::Raw(text) => Cow::Borrowed(text),
            Self::Structured(message) => Cow::Owned(message.to_xml()),
        }
    }

    /// Returns the `(type name, identifier)` pair a signer needs.
    ///
    /// Raw text is inspected for its root element name and `ID` attribute.
    pub fn signing_target(&self) -> SamlResult<(String, String)> {
        match *self {
            Self::Structured(message) => {
                Ok((message.type_name().to_string(), message.id().to_string()))
            }
            Self::Raw(text) => {
                let root = Element::parse(text).map_err(|e| {
                    SamlError::Signing(format!("cannot locate message to sign: {e}"))
                })?;
                let id = root.attribute("ID").ok_or_else(|| {
                    SamlError::Signing(format!("{} carries no ID attribute", root.name))
                })?;
                Ok((root.name.local.clone(), id.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for ProtocolMessage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw(text) => f.debug_tuple("Raw").field(text).finish(),
            Self::Structured(message) => f
                .debug_struct("Structured")
                .field("type", &message.type_name())
                .field("id", &message.id())
                .finish(),
        }
    }
}

impl<'a> From<&'a str> for ProtocolMessage<'a> {
    fn from(text: &'a str) -> Self {
        Self::Raw(text)
    }
}

impl<'a> From<&'a String> for ProtocolMessage<'a> {
    fn from(text: &'a String) -> Self {
        Self::Raw(text.as_str())
    }
}

/// Checks that `element` has the qualified name of `T`.
pub(crate) fn expect_tag<T: FromElement>(element: &Element) -> SamlResult<()> {
    if element.name.is(T::NAMESPACE, T::TAG) {
        Ok(())
    } else {
        Err(SamlError::XmlParse(format!(
            "expected {}, found {}",
            T::qualified_name(),
            element.name
        )))
    }
}

/// Returns a required unqualified attribute.
pub(crate) fn required_attribute<'e>(element: &'e Element, name: &str) -> SamlResult<&'e str> {
    element
        .attribute(name)
        .ok_or_else(|| SamlError::MissingElement(format!("{}@{}", element.name.local, name)))
}

/// Returns the trimmed text of a required child element.
pub(crate) fn required_child_text(
    element: &Element,
    namespace: &str,
    local: &str,
) -> SamlResult<String> {
    element
        .find(namespace, local)
        .map(Element::text)
        .ok_or_else(|| SamlError::MissingElement(local.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping {
        id: String,
    }

    impl ToElement for Ping {
        fn to_element(&self) -> Element {
            Element::ns("urn:test", "Ping").with_attribute("ID", self.id.clone())
        }
    }

    impl SamlMessage for Ping {
        fn type_name(&self) -> &'static str {
            "Ping"
        }

        fn id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn raw_text_is_borrowed() {
        let msg = ProtocolMessage::from("<a/>");
        assert!(matches!(msg.to_text(), Cow::Borrowed("<a/>")));
    }

    #[test]
    fn structured_text_goes_through_tree() {
        let ping = Ping { id: "_p1".to_string() };
        let text = ProtocolMessage::structured(&ping).to_text();
        assert!(text.contains(r#"<ns0:Ping xmlns:ns0="urn:test" ID="_p1" />"#));
    }

    #[test]
    fn signing_target_for_structured_message() {
        let ping = Ping { id: "_p1".to_string() };
        let target = ProtocolMessage::structured(&ping).signing_target().unwrap();
        assert_eq!(target, ("Ping".to_string(), "_p1".to_string()));
    }

    #[test]
    fn signing_target_for_raw_message() {
        let raw = r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_r9"/>"#;
        let target = ProtocolMessage::Raw(raw).signing_target().unwrap();
        assert_eq!(target, ("LogoutRequest".to_string(), "_r9".to_string()));

        let err = ProtocolMessage::Raw("<NoId/>").signing_target().unwrap_err();
        assert!(matches!(err, SamlError::Signing(_)));
    }
}
