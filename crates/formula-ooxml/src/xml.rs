//! In-memory XML element trees.
//!
//! This is the boundary with byte-level XML: `roxmltree` parses documents into [`XmlElement`]s and
//! `quick_xml` writes them back out. Schema conversion only ever sees the tree.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::Cursor;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::namespaces::{NamespaceRegistry, QName, XML_NS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: QName,
    /// Attributes in document (or declaration) order.
    pub attrs: Vec<(QName, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

impl XmlElement {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Value of an attribute without a namespace.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attr_ns(None, local)
    }

    pub fn attr_ns(&self, ns: Option<&str>, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name.matches(ns, local))
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing one with the same name.
    pub fn set_attr(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// First child with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name.local == local)
    }

    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name.local == local)
    }

    /// Parse a document and return its root element.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        Ok(Self::from_roxmltree(doc.root_element()))
    }

    pub fn from_roxmltree(node: roxmltree::Node<'_, '_>) -> Self {
        // roxmltree reports elements under `xmlns=""` as being in the empty namespace.
        let mut element = Self::new(QName::new(
            node.tag_name().namespace().filter(|ns| !ns.is_empty()),
            node.tag_name().name(),
        ));

        // roxmltree keeps `xmlns` declarations out of `attributes()`.
        for attr in node.attributes() {
            let ns = attr.namespace().filter(|ns| !ns.is_empty());
            element
                .attrs
                .push((QName::new(ns, attr.name()), attr.value().to_string()));
        }

        let mut text = String::new();
        for child in node.children() {
            match child.node_type() {
                roxmltree::NodeType::Element => element.children.push(Self::from_roxmltree(child)),
                roxmltree::NodeType::Text => text.push_str(child.text().unwrap_or_default()),
                _ => {}
            }
        }
        // Whitespace between child elements is insignificant; text-only content is kept verbatim.
        if !text.is_empty() && (element.children.is_empty() || !text.trim().is_empty()) {
            element.text = Some(text);
        }

        element
    }

    /// A copy with attributes sorted and whitespace-only text between elements dropped, for
    /// order-insensitive comparisons.
    pub fn normalized(&self) -> Self {
        let mut attrs = self.attrs.clone();
        attrs.sort();
        let text = match &self.text {
            Some(t) if !self.children.is_empty() && t.trim().is_empty() => None,
            other => other.clone(),
        };
        Self {
            name: self.name.clone(),
            attrs,
            children: self.children.iter().map(Self::normalized).collect(),
            text,
        }
    }

    /// Serialize the tree. The root's namespace becomes the default namespace; other namespaces
    /// are declared on the root using the aliases in `registry` (or generated `nsN` prefixes).
    pub fn to_xml_string(&self, registry: &NamespaceRegistry) -> Result<String> {
        let prefixes = PrefixMap::collect(self, registry);
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_element(&mut writer, self, &prefixes, None, true)?;
        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

struct PrefixMap {
    default_ns: Option<String>,
    /// URI -> prefix, in first-seen order of declaration.
    prefixes: Vec<(String, String)>,
}

impl PrefixMap {
    fn collect(root: &XmlElement, registry: &NamespaceRegistry) -> Self {
        let default_ns = root.name.ns.clone();
        let mut seen = BTreeSet::new();
        let mut prefixes = Vec::new();
        let mut generated = 0usize;

        let mut stack = vec![root];
        while let Some(element) = stack.pop() {
            let attr_names = element.attrs.iter().map(|(name, _)| (name, true));
            let names = std::iter::once((&element.name, false)).chain(attr_names);
            for (name, is_attr) in names {
                let Some(ns) = name.ns.as_deref() else { continue };
                // Unprefixed attributes never take the default namespace, so attributes always need
                // a prefix.
                if (!is_attr && Some(ns) == default_ns.as_deref()) || ns == XML_NS {
                    continue;
                }
                if !seen.insert(ns.to_string()) {
                    continue;
                }
                let prefix = match registry.alias(ns) {
                    Some(alias) if !prefixes.iter().any(|(_, p)| p == alias) => alias.to_string(),
                    // Generated prefixes must not shadow a registered alias.
                    _ => loop {
                        let p = format!("ns{generated}");
                        generated += 1;
                        if registry.uri(&p).is_none() && !prefixes.iter().any(|(_, q)| *q == p) {
                            break p;
                        }
                    },
                };
                prefixes.push((ns.to_string(), prefix));
            }
            stack.extend(element.children.iter().rev());
        }

        Self {
            default_ns,
            prefixes,
        }
    }

    fn prefix(&self, ns: &str) -> Option<&str> {
        if ns == XML_NS {
            return Some("xml");
        }
        self.prefixes
            .iter()
            .find(|(uri, _)| uri == ns)
            .map(|(_, p)| p.as_str())
    }

    fn element_name(&self, name: &QName) -> String {
        match name.ns.as_deref() {
            Some(ns) if Some(ns) == self.default_ns.as_deref() => name.local.clone(),
            Some(ns) => match self.prefix(ns) {
                Some(prefix) => format!("{prefix}:{}", name.local),
                None => name.local.clone(),
            },
            None => name.local.clone(),
        }
    }

    fn attr_name(&self, name: &QName) -> String {
        match name.ns.as_deref().and_then(|ns| self.prefix(ns)) {
            Some(prefix) => format!("{prefix}:{}", name.local),
            None => name.local.clone(),
        }
    }
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
    prefixes: &PrefixMap,
    inherited_default: Option<&str>,
    is_root: bool,
) -> std::result::Result<(), quick_xml::Error> {
    let tag = prefixes.element_name(&element.name);
    let mut start = BytesStart::new(tag.as_str());

    let mut current_default = inherited_default;
    if is_root {
        if let Some(ns) = prefixes.default_ns.as_deref() {
            start.push_attribute(("xmlns", ns));
            current_default = Some(ns);
        }
        for (uri, prefix) in &prefixes.prefixes {
            start.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
        }
    } else {
        match element.name.ns.as_deref() {
            // Step out of the inherited default namespace.
            None if inherited_default.is_some() => {
                start.push_attribute(("xmlns", ""));
                current_default = None;
            }
            // Back into the root namespace below an `xmlns=""` reset.
            Some(ns)
                if Some(ns) == prefixes.default_ns.as_deref() && inherited_default != Some(ns) =>
            {
                start.push_attribute(("xmlns", ns));
                current_default = Some(ns);
            }
            _ => {}
        }
    }

    for (name, value) in &element.attrs {
        let key = prefixes.attr_name(name);
        start.push_attribute(Attribute {
            key: quick_xml::name::QName(key.as_bytes()),
            value: Cow::Owned(escape_attr(value).into_bytes()),
        });
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
    }
    for child in &element.children {
        write_element(writer, child, prefixes, current_default, false)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
    Ok(())
}

/// Parsers normalize literal whitespace in attribute values and carriage returns in text, so those
/// are written as character references.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\r', "&#13;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{REL_NS, SHEET_MAIN_NS};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_namespaces_attributes_and_text() {
        let xml = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
                xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
              <hyperlink ref="A1" r:id="rId1"/>
              <t xml:space="preserve"> </t>
            </worksheet>"#;
        let root = XmlElement::parse_str(xml).unwrap();
        assert!(root.name.matches(Some(SHEET_MAIN_NS), "worksheet"));
        assert_eq!(root.text, None);
        let link = root.child("hyperlink").unwrap();
        assert_eq!(link.attr("ref"), Some("A1"));
        assert_eq!(link.attr_ns(Some(REL_NS), "id"), Some("rId1"));
        assert_eq!(link.attr("id"), None);
        assert_eq!(root.child("t").unwrap().text.as_deref(), Some(" "));
    }

    #[test]
    fn writes_default_and_prefixed_namespaces() {
        let mut root = XmlElement::new(QName::new(Some(SHEET_MAIN_NS), "hyperlinks"));
        let mut link = XmlElement::new(QName::new(Some(SHEET_MAIN_NS), "hyperlink"));
        link.set_attr(QName::local("ref"), "A1");
        link.set_attr(QName::new(Some(REL_NS), "id"), "rId1");
        root.children.push(link);

        let xml = root.to_xml_string(&NamespaceRegistry::default()).unwrap();
        assert_eq!(
            xml,
            format!(
                r#"<hyperlinks xmlns="{SHEET_MAIN_NS}" xmlns:r="{REL_NS}"><hyperlink ref="A1" r:id="rId1"/></hyperlinks>"#
            )
        );

        let reparsed = XmlElement::parse_str(&xml).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn unqualified_children_leave_the_default_namespace() {
        let mut root = XmlElement::new(QName::new(Some(SHEET_MAIN_NS), "root"));
        root.children.push(XmlElement::new(QName::local("plain")));
        let xml = root.to_xml_string(&NamespaceRegistry::empty()).unwrap();
        assert_eq!(xml, format!(r#"<root xmlns="{SHEET_MAIN_NS}"><plain xmlns=""/></root>"#));
        assert_eq!(XmlElement::parse_str(&xml).unwrap(), root);
    }

    #[test]
    fn root_namespace_is_redeclared_below_an_unqualified_element() {
        let mut plain = XmlElement::new(QName::local("plain"));
        plain
            .children
            .push(XmlElement::new(QName::new(Some(SHEET_MAIN_NS), "inner")));
        let mut root = XmlElement::new(QName::new(Some(SHEET_MAIN_NS), "root"));
        root.children.push(plain);

        let xml = root.to_xml_string(&NamespaceRegistry::empty()).unwrap();
        assert_eq!(
            xml,
            format!(
                r#"<root xmlns="{SHEET_MAIN_NS}"><plain xmlns=""><inner xmlns="{SHEET_MAIN_NS}"/></plain></root>"#
            )
        );
        assert_eq!(XmlElement::parse_str(&xml).unwrap(), root);
    }

    #[test]
    fn generated_prefixes_avoid_registered_aliases() {
        let mut registry = NamespaceRegistry::empty();
        registry.register("ns0", "urn:registered").unwrap();

        let mut root = XmlElement::new(QName::local("root"));
        root.set_attr(QName::new(Some("urn:other"), "a"), "1");
        root.set_attr(QName::new(Some("urn:registered"), "b"), "2");

        let xml = root.to_xml_string(&registry).unwrap();
        assert_eq!(
            xml,
            r#"<root xmlns:ns1="urn:other" xmlns:ns0="urn:registered" ns1:a="1" ns0:b="2"/>"#
        );
        assert_eq!(XmlElement::parse_str(&xml).unwrap(), root);
    }

    #[test]
    fn empty_namespace_reads_as_unqualified() {
        let root = XmlElement::parse_str(&format!(
            r#"<root xmlns="{SHEET_MAIN_NS}"><plain xmlns="" a="1"/></root>"#
        ))
        .unwrap();
        let plain = root.child("plain").unwrap();
        assert_eq!(plain.name, QName::local("plain"));
        assert_eq!(plain.attr("a"), Some("1"));
    }

    #[test]
    fn escapes_text_and_attribute_values() {
        let mut root = XmlElement::new(QName::local("t"));
        root.set_attr(QName::local("a"), "x<\"y\"\tz\n");
        root.text = Some("1 < 2 & 3\r\n".to_string());
        let xml = root.to_xml_string(&NamespaceRegistry::empty()).unwrap();
        assert_eq!(XmlElement::parse_str(&xml).unwrap(), root);
    }

    #[test]
    fn normalized_ignores_attribute_order() {
        let mut a = XmlElement::new(QName::local("x"));
        a.set_attr(QName::local("b"), "2");
        a.set_attr(QName::local("a"), "1");
        let mut b = XmlElement::new(QName::local("x"));
        b.set_attr(QName::local("a"), "1");
        b.set_attr(QName::local("b"), "2");
        assert_ne!(a, b);
        assert_eq!(a.normalized(), b.normalized());
    }
}
