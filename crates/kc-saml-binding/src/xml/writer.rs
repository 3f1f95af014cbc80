//! Element tree serialization.

use quick_xml::escape::{escape, partial_escape};

use super::{Element, Node, QName};
use crate::types::{ECP_NS, PAOS_NS, SAMLP_NS, SAML_NS, SOAP_ENV_NS, XMLDSIG_NS, XSI_NS};

/// XML declaration written at the head of every serialized document.
pub(crate) const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Prefixes used for well-known namespaces.
const REGISTERED_PREFIXES: &[(&str, &str)] = &[
    (SOAP_ENV_NS, "SOAP-ENV"),
    (SAML_NS, "saml"),
    (SAMLP_NS, "samlp"),
    (XMLDSIG_NS, "ds"),
    (ECP_NS, "ecp"),
    (PAOS_NS, "paos"),
    (XSI_NS, "xsi"),
];

/// Namespace URI to prefix bindings, in first-use order.
struct Prefixes {
    bindings: Vec<(String, String)>,
    next_generated: usize,
}

impl Prefixes {
    fn collect(root: &Element) -> Self {
        let mut prefixes = Self {
            bindings: Vec::new(),
            next_generated: 0,
        };
        prefixes.visit(root);
        prefixes
    }

    fn visit(&mut self, element: &Element) {
        self.bind(&element.name);
        for (name, _) in &element.attributes {
            self.bind(name);
        }
        for child in element.child_elements() {
            self.visit(child);
        }
    }

    fn bind(&mut self, name: &QName) {
        let Some(ns) = name.namespace.as_deref() else {
            return;
        };
        if self.bindings.iter().any(|(uri, _)| uri == ns) {
            return;
        }
        let prefix = match REGISTERED_PREFIXES.iter().find(|(uri, _)| *uri == ns) {
            Some((_, prefix)) => (*prefix).to_string(),
            None => {
                let prefix = format!("ns{}", self.next_generated);
                self.next_generated += 1;
                prefix
            }
        };
        self.bindings.push((ns.to_string(), prefix));
    }

    fn qualify(&self, name: &QName) -> String {
        let prefix = name
            .namespace
            .as_deref()
            .and_then(|ns| self.bindings.iter().find(|(uri, _)| uri == ns))
            .map(|(_, prefix)| prefix.as_str());
        match prefix {
            Some(p) => format!("{}:{}", p, name.local),
            None => name.local.clone(),
        }
    }
}

/// Serializes `root` as a complete document.
pub(crate) fn serialize(root: &Element) -> String {
    let prefixes = Prefixes::collect(root);
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    write_element(&mut out, root, &prefixes, true);
    out
}

fn write_element(out: &mut String, element: &Element, prefixes: &Prefixes, is_root: bool) {
    let tag = prefixes.qualify(&element.name);
    out.push('<');
    out.push_str(&tag);

    if is_root {
        for (uri, prefix) in &prefixes.bindings {
            out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(uri.as_str())));
        }
    }

    for (name, value) in &element.attributes {
        out.push_str(&format!(
            " {}=\"{}\"",
            prefixes.qualify(name),
            escape(value.as_str())
        ));
    }

    if element.children.is_empty() {
        out.push_str(" />");
        return;
    }

    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(out, e, prefixes, false),
            Node::Text(t) => out.push_str(&partial_escape(t.as_str())),
        }
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_namespaces_on_root() {
        let root = Element::ns(SOAP_ENV_NS, "Envelope")
            .with_child(Element::ns(SOAP_ENV_NS, "Body").with_child(Element::ns("urn:other", "X")));

        let xml = serialize(&root);
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains(&format!(
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="{SOAP_ENV_NS}" xmlns:ns0="urn:other">"#
        )));
        assert!(xml.contains("<ns0:X />"));
        assert!(xml.ends_with("</SOAP-ENV:Body></SOAP-ENV:Envelope>"));
    }

    #[test]
    fn generated_prefixes_are_sequential() {
        let root = Element::ns("urn:a", "A")
            .with_child(Element::ns("urn:b", "B"))
            .with_child(Element::ns("urn:a", "C"));

        let xml = serialize(&root);
        assert!(xml.contains(r#"<ns0:A xmlns:ns0="urn:a" xmlns:ns1="urn:b">"#));
        assert!(xml.contains("<ns1:B />"));
        assert!(xml.contains("<ns0:C />"));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let root = Element::ns(SAML_NS, "Issuer")
            .with_attribute("Format", r#"a"b<c"#)
            .with_text("x & y < z");

        let xml = serialize(&root);
        assert!(xml.contains(r#"Format="a&quot;b&lt;c""#));
        assert!(xml.contains(">x &amp; y &lt; z<"));
    }
}
