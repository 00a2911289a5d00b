pub mod client;
pub mod contents;
pub mod error;
pub mod http;

pub use client::{HubClient, HubEndpoint, HubTransport};
pub use contents::{ContentEntry, EntryKind, Listing};
pub use error::{redact_query, ProtocolError};
