use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::hooks::LifecycleHooks;

/// Stable identity of an element within a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh UUID v4 identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Whether an element participates in the render lifecycle.
#[derive(Clone, Default)]
pub enum ElementKind {
    #[default]
    Plain,
    Reactive(LifecycleHooks),
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Plain => f.write_str("Plain"),
            ElementKind::Reactive(_) => f.write_str("Reactive"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

/// A node of the document tree with a tag, optional identity, attributes
/// and children.
#[derive(Clone, Debug)]
pub struct Element {
    tag: String,
    id: Option<ElementId>,
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
    kind: ElementKind,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            kind: ElementKind::Plain,
        }
    }

    // ── Builders ──

    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Make this element lifecycle-bearing.
    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.kind = ElementKind::Reactive(hooks);
        self
    }

    // ── Accessors ──

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&ElementId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: ElementId) {
        self.id = Some(id);
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn hooks(&self) -> Option<&LifecycleHooks> {
        match &self.kind {
            ElementKind::Reactive(hooks) => Some(hooks),
            ElementKind::Plain => None,
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self.kind, ElementKind::Reactive(_))
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Depth-first search for an element (self included) by id.
    pub fn find(&self, id: &ElementId) -> Option<&Element> {
        if self.id.as_ref() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(id))
    }

    pub(crate) fn find_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        if self.id.as_ref() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(child) => child.find_mut(id),
            Node::Text(_) => None,
        })
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Markup rendition of this element and its subtree.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = &self.id {
            out.push_str(" id=\"");
            escape_into(id.as_str(), out);
            out.push('"');
        }
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(value, out);
            out.push('"');
        }
        out.push('>');
        for node in &self.children {
            match node {
                Node::Text(t) => escape_into(t, out),
                Node::Element(e) => e.write_html(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("div")
            .with_id("outer")
            .with_child(Element::new("span").with_id("inner").with_child("hi"))
            .with_child(" there")
    }

    #[test]
    fn find_searches_depth_first() {
        let root = sample();
        assert_eq!(root.find(&"inner".into()).map(Element::tag), Some("span"));
        assert_eq!(root.find(&"outer".into()).map(Element::tag), Some("div"));
        assert!(root.find(&"missing".into()).is_none());
    }

    #[test]
    fn text_content_concatenates_descendants() {
        assert_eq!(sample().text_content(), "hi there");
    }

    #[test]
    fn outer_html_escapes_text_and_attributes() {
        let el = Element::new("p")
            .with_attr("title", "a \"b\"")
            .with_child("1 < 2 & 3");
        assert_eq!(
            el.outer_html(),
            "<p title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3</p>"
        );
    }

    #[test]
    fn hooks_mark_element_reactive() {
        let plain = Element::new("div");
        assert!(!plain.is_reactive());
        assert!(plain.hooks().is_none());

        let reactive = Element::new("div").with_hooks(LifecycleHooks::default());
        assert!(reactive.is_reactive());
        assert!(reactive.hooks().is_some());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ElementId::generate(), ElementId::generate());
    }
}
