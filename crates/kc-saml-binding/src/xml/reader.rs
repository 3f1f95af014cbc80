//! Element tree parsing on top of `quick_xml::NsReader`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use super::{Element, Node, QName};
use crate::error::{SamlError, SamlResult};

/// Parses `text` into its root element.
pub(crate) fn parse(text: &str) -> SamlResult<Element> {
    let mut reader = NsReader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let ns = owned_namespace(ns)?;
        match event {
            Event::Start(start) => {
                let element = open_element(&reader, ns, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, ns, &start)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SamlError::XmlParse("unbalanced end tag".to_string()))?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(c) => {
                let text = String::from_utf8(c.into_inner().into_owned())
                    .map_err(|e| SamlError::XmlParse(e.to_string()))?;
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SamlError::XmlParse("unclosed element at end of input".to_string()));
    }
    root.ok_or_else(|| SamlError::XmlParse("document has no root element".to_string()))
}

fn owned_namespace(ns: ResolveResult<'_>) -> SamlResult<Option<String>> {
    match ns {
        ResolveResult::Bound(ns) => String::from_utf8(ns.as_ref().to_vec())
            .map(Some)
            .map_err(|e| SamlError::XmlParse(e.to_string())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(SamlError::XmlParse(format!(
            "unknown namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn utf8(bytes: &[u8]) -> SamlResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| SamlError::XmlParse(e.to_string()))
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> SamlResult<Element> {
    let name = QName {
        namespace,
        local: utf8(start.local_name().as_ref())?,
    };
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let name = QName {
            namespace: owned_namespace(ns)?,
            local: utf8(local.as_ref())?,
        };
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((name, value));
    }

    Ok(element)
}

fn close_element(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> SamlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(SamlError::XmlParse(
            "multiple root elements".to_string(),
        )),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> SamlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Text(text.to_string()));
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(SamlError::XmlParse(
            "character data outside the root element".to_string(),
        )),
    }
}
