//! Page Module
//!
//! The cacheable unit served by the mediator: one wiki page.

use crate::cache::Cacheable;

// == Page ==
/// A wiki page, identified by its title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    title: String,
    content: String,
}

impl Page {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Full text of the page.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Cacheable for Page {
    fn id(&self) -> &str {
        &self.title
    }
}
