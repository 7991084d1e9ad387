//! Document contracts and tree search.

use std::io;
use std::path::Path;
use std::rc::Rc;

use crate::element::{EList, Element, ElementRef};
use crate::error::DomError;

/// A simplified document: a root element plus tree-wide queries.
///
/// Search walks the tree depth-first in document order. The `get_by`
/// variants return the first match, the `find_by` variants every match.
/// XPath and CSS selector queries are outside this contract.
pub trait Document {
    /// Whether the document follows XML rules (as opposed to HTML).
    fn is_xml(&self) -> bool;

    fn root(&self) -> ElementRef;

    /// Creates a detached element owned by this document.
    fn create_element(&self, tag: &str) -> Result<ElementRef, DomError>;

    fn serialize(&self, out: &mut dyn io::Write) -> Result<(), DomError>;

    fn get_by_tag(&self, tag: &str) -> Option<ElementRef> {
        self.find_by_tag(tag).first()
    }

    fn find_by_tag(&self, tag: &str) -> EList {
        let mut found = Vec::new();
        collect_matching(self.root(), &|element| element.tag() == tag, &mut found);
        found.into()
    }

    fn get_by_css_class(&self, name: &str) -> Option<ElementRef> {
        self.find_by_css_class(name).first()
    }

    fn find_by_css_class(&self, name: &str) -> EList {
        let mut found = Vec::new();
        collect_matching(
            self.root(),
            &|element| element.has_css_class(name),
            &mut found,
        );
        found.into()
    }
}

fn collect_matching(
    node: ElementRef,
    matches: &dyn Fn(&dyn Element) -> bool,
    found: &mut Vec<ElementRef>,
) {
    if matches(&*node.borrow()) {
        found.push(Rc::clone(&node));
    }
    let children = node.borrow().children();
    for child in children {
        collect_matching(child, matches, found);
    }
}

/// Factory for documents: fresh trees and parsed markup.
pub trait DocumentBuilder {
    fn create_document(&self, root_tag: &str) -> Result<Box<dyn Document>, DomError>;

    fn parse_xml(&self, input: &str) -> Result<Box<dyn Document>, DomError>;

    fn parse_html(&self, input: &str) -> Result<Box<dyn Document>, DomError>;

    fn load_xml(&self, path: &Path) -> Result<Box<dyn Document>, DomError> {
        let input = std::fs::read_to_string(path)?;
        self.parse_xml(&input)
    }
}
