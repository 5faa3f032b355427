use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::element::{Element, ElementId, Node};
use crate::error::{RenderError, Result};

/// Id of the body element every document starts with.
pub const ROOT_ID: &str = "root";

/// Shared, mutable document tree.
///
/// Cloning is cheap; all clones see the same tree.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<DocumentTree>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with a `<body id="root">`.
    pub fn new() -> Self {
        Self::with_root(Element::new("body").with_id(ROOT_ID))
    }

    pub fn with_root(mut root: Element) -> Self {
        if root.id().is_none() {
            root.set_id(ElementId::new(ROOT_ID));
        }
        Self {
            inner: Arc::new(RwLock::new(DocumentTree { root })),
        }
    }

    pub fn get_element_by_id(&self, id: &ElementId) -> Option<ElementHandle> {
        self.contains(id).then(|| ElementHandle {
            id: id.clone(),
            document: self.clone(),
        })
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.read().find(id).is_some()
    }

    /// Clone of the whole tree.
    pub fn snapshot(&self) -> Element {
        self.read().root.clone()
    }

    pub fn append_child(&self, container: &ElementId, element: Element) -> Result<()> {
        self.write().append_child(container, element)
    }

    pub fn replace_with(&self, target: &ElementId, element: Element) -> Result<()> {
        self.write().replace_with(target, element)
    }

    pub fn outer_html(&self) -> String {
        self.read().root.outer_html()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, DocumentTree> {
        self.inner.read().unwrap()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, DocumentTree> {
        self.inner.write().unwrap()
    }
}

/// The tree behind a [`Document`], as seen by attach strategies.
pub struct DocumentTree {
    root: Element,
}

impl DocumentTree {
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn find(&self, id: &ElementId) -> Option<&Element> {
        self.root.find(id)
    }

    /// Append `element` as the last child of `container`.
    pub fn append_child(&mut self, container: &ElementId, element: Element) -> Result<()> {
        let parent = self
            .root
            .find_mut(container)
            .ok_or_else(|| RenderError::ElementNotFound(container.clone()))?;
        parent.children_mut().push(Node::Element(element));
        Ok(())
    }

    /// Swap `element` into the position of `target`.
    pub fn replace_with(&mut self, target: &ElementId, element: Element) -> Result<()> {
        if self.root.id() == Some(target) {
            self.root = element;
            return Ok(());
        }
        if replace_in(&mut self.root, target, &mut Some(element)) {
            Ok(())
        } else {
            Err(RenderError::ElementNotFound(target.clone()))
        }
    }
}

fn replace_in(parent: &mut Element, target: &ElementId, element: &mut Option<Element>) -> bool {
    for node in parent.children_mut() {
        if let Node::Element(child) = node {
            if child.id() == Some(target) {
                if let Some(el) = element.take() {
                    *child = el;
                }
                return true;
            }
            if replace_in(child, target, element) {
                return true;
            }
        }
    }
    false
}

/// Live reference to an element attached to a document, located by id.
#[derive(Clone)]
pub struct ElementHandle {
    id: ElementId,
    document: Document,
}

impl ElementHandle {
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_attached(&self) -> bool {
        self.document.contains(&self.id)
    }

    /// Current state of the element, or `None` if it has been removed.
    pub fn snapshot(&self) -> Option<Element> {
        self.document.read().find(&self.id).cloned()
    }

    pub fn text_content(&self) -> Option<String> {
        self.document.read().find(&self.id).map(Element::text_content)
    }
}

impl std::fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementHandle").field("id", &self.id).finish()
    }
}
