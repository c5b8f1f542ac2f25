//! Wiki Relay - A caching relay for wiki page lookups
//!
//! Fronts a remote wiki-style content source with a bounded TTL page
//! cache and query-popularity statistics, served over a line-oriented
//! TCP protocol.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod mediator;
pub mod server;
pub mod source;
pub mod stats;

pub use config::Config;
pub use error::{RelayError, Result};
pub use mediator::WikiRelay;
pub use server::RelayServer;
pub use source::ContentSource;
