//! Owned XML tree and namespace-bound path queries.
//!
//! Vendor descriptors are small, so the whole document is parsed into an
//! owned tree with [`quick_xml::NsReader`] and queried with simple
//! slash-separated paths. A path step matches child elements by local name
//! in the query's namespace; there is no XPath engine behind it.

use std::collections::HashMap;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::XmlError;

/// A parsed element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Element content in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn new(namespace: Option<String>, name: String) -> Self {
        Self {
            namespace,
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Namespace URI the element is bound to, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name, without prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First attribute with the given local name, whatever its namespace.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }
}

/// A well-formed document with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: Element,
}

impl XmlDocument {
    /// Parse a complete document.
    ///
    /// Fails on syntax errors, mismatched or unclosed tags, missing or
    /// multiple roots, and non-whitespace text outside the root. Internal
    /// general entities declared in the DOCTYPE are expanded.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut entities: HashMap<String, String> = HashMap::new();

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| XmlError::Malformed(e.to_string()))?;
            let namespace = match resolved {
                ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
                _ => None,
            };

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let mut element = Element::new(namespace, name);

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
                        if attr.key.as_namespace_binding().is_some() {
                            continue;
                        }
                        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                        let value = attr
                            .unescape_value_with(|name| resolve_entity(&entities, name))
                            .map_err(|e| XmlError::Malformed(e.to_string()))?
                            .into_owned();
                        element.attributes.push((key, value));
                    }

                    if matches!(event, Event::Start(_)) {
                        stack.push(element);
                    } else {
                        Self::attach(&mut stack, &mut root, element)?;
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unexpected end tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(ref t) => {
                    let text = t
                        .unescape_with(|name| resolve_entity(&entities, name))
                        .map_err(|e| XmlError::Malformed(e.to_string()))?
                        .into_owned();
                    Self::push_text(&mut stack, text)?;
                }
                Event::CData(ref c) => {
                    let text = std::str::from_utf8(c)
                        .map_err(|e| XmlError::Malformed(e.to_string()))?
                        .to_string();
                    Self::push_text(&mut stack, text)?;
                }
                Event::DocType(ref d) => {
                    let dtd = std::str::from_utf8(d)
                        .map_err(|e| XmlError::Malformed(e.to_string()))?;
                    entities.extend(internal_entities(dtd));
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::UnclosedElement(open.name));
        }
        root.map(|root| XmlDocument { root }).ok_or(XmlError::NoRoot)
    }

    fn attach(
        stack: &mut [Element],
        root: &mut Option<Element>,
        element: Element,
    ) -> Result<(), XmlError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None if root.is_some() => return Err(XmlError::MultipleRoots),
            None => *root = Some(element),
        }
        Ok(())
    }

    fn push_text(stack: &mut [Element], text: String) -> Result<(), XmlError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Text(text)),
            None if text.trim().is_empty() => {}
            None => return Err(XmlError::TextOutsideRoot),
        }
        Ok(())
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Query context bound to the root element's namespace.
    pub fn query(&self) -> QueryContext<'_> {
        QueryContext {
            root: &self.root,
            namespace: self.root.namespace(),
        }
    }
}

fn resolve_entity<'e>(entities: &'e HashMap<String, String>, name: &str) -> Option<&'e str> {
    entities
        .get(name)
        .map(String::as_str)
        .or_else(|| resolve_predefined_entity(name))
}

/// `<!ENTITY name "value">` declarations of an internal DTD subset.
///
/// Parameter and external entities are skipped. Values are taken
/// literally.
fn internal_entities(dtd: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    let mut rest = dtd;
    while let Some(start) = rest.find("<!ENTITY") {
        rest = rest[start + "<!ENTITY".len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(end) = rest[1..].find(quote) else {
            break;
        };
        if !name.is_empty() {
            found.push((name.to_string(), rest[1..1 + end].to_string()));
        }
        rest = &rest[1 + end + 1..];
    }
    found
}

/// Path queries over a document, with every step in one namespace.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'d> {
    root: &'d Element,
    namespace: Option<&'d str>,
}

impl<'d> QueryContext<'d> {
    /// All elements reached from `node` by the relative `path`, in
    /// document order.
    pub fn select(&self, node: &'d Element, path: &str) -> Vec<&'d Element> {
        let mut current = vec![node];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.child_elements())
                .filter(|e| e.is(self.namespace, step))
                .collect();
        }
        current
    }

    /// Elements matched by an absolute path whose first step names the root.
    pub fn select_from_root(&self, path: &str) -> Vec<&'d Element> {
        let path = path.trim_start_matches('/');
        let (first, rest) = path.split_once('/').unwrap_or((path, ""));
        if !self.root.is(self.namespace, first) {
            return Vec::new();
        }
        self.select(self.root, rest)
    }

    /// Text content of the first match.
    pub fn first_text(&self, node: &'d Element, path: &str) -> Option<String> {
        self.select(node, path).first().map(|e| e.text())
    }

    /// Named attribute of the first match.
    ///
    /// Only the first match is consulted; a later match carrying the
    /// attribute does not count.
    pub fn first_attribute(&self, node: &'d Element, path: &str, name: &str) -> Option<&'d str> {
        self.select(node, path).first().and_then(|e| e.attribute(name))
    }
}
