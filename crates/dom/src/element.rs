//! Element handles and element lists.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared mutable handle to an element in a document tree.
pub type ElementRef = Rc<RefCell<dyn Element>>;

/// One element of a simplified document tree.
///
/// Elements carry a tag, string attributes, text content and child
/// elements. The model is deliberately small: no namespaces, no processing
/// instructions, no distinction between text nodes and element text.
pub trait Element {
    fn tag(&self) -> &str;

    fn attr(&self, name: &str) -> Option<String>;

    fn set_attr(&mut self, name: &str, value: &str);

    fn attr_names(&self) -> Vec<String>;

    /// The text content of this element and all its descendants,
    /// concatenated in document order.
    fn text(&self) -> String;

    fn set_text(&mut self, text: &str);

    /// Snapshot of the direct children.
    fn children(&self) -> EList;

    fn add_child(&mut self, child: ElementRef);

    /// First direct child with the given tag.
    fn child_by_tag(&self, tag: &str) -> Option<ElementRef> {
        self.children()
            .iter()
            .find(|child| child.borrow().tag() == tag)
            .cloned()
    }

    /// Whether the `class` attribute contains the given token.
    fn has_css_class(&self, name: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|token| token == name))
            .unwrap_or(false)
    }
}

/// Ordered list of element handles.
///
/// Methods that return elements hand out clones of the shared handles, so
/// a list can outlive the query that produced it.
#[derive(Default, Clone)]
pub struct EList {
    items: Vec<ElementRef>,
}

impl EList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<ElementRef> {
        self.items.get(index).cloned()
    }

    pub fn first(&self) -> Option<ElementRef> {
        self.items.first().cloned()
    }

    pub fn push(&mut self, element: ElementRef) {
        self.items.push(element);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ElementRef> {
        self.items.iter()
    }

    /// Sets an attribute on every element in the list.
    pub fn set_attr_all(&self, name: &str, value: &str) {
        for element in &self.items {
            element.borrow_mut().set_attr(name, value);
        }
    }
}

impl fmt::Debug for EList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EList").field("size", &self.items.len()).finish()
    }
}

impl From<Vec<ElementRef>> for EList {
    fn from(items: Vec<ElementRef>) -> Self {
        EList { items }
    }
}

impl FromIterator<ElementRef> for EList {
    fn from_iter<I: IntoIterator<Item = ElementRef>>(iter: I) -> Self {
        EList {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EList {
    type Item = ElementRef;
    type IntoIter = std::vec::IntoIter<ElementRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a EList {
    type Item = &'a ElementRef;
    type IntoIter = std::slice::Iter<'a, ElementRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
