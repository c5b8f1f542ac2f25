//! Mediator Module
//!
//! Fronts the content source with the page cache and the statistics
//! engine.

mod page;
mod service;

// Re-export public types
pub use page::Page;
pub use service::WikiRelay;
