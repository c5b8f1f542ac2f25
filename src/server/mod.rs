//! Server Module
//!
//! Line-oriented TCP dispatch layer: one JSON request and one JSON reply
//! per connection.
//!
//! # Operations
//! - `search` - titles matching a query
//! - `getPage` - page text by title
//! - `zeitgeist` - all-time most common queries
//! - `trending` - most common queries of the last 30 seconds
//! - `peakLoad30s` - peak operation count over any 30-second interval
//! - `stop` - persist statistics and shut the server down

pub mod dispatch;
pub mod protocol;

pub use dispatch::RelayServer;
pub use protocol::{ByeEnvelope, Payload, ResultEnvelope, WireRequest};
