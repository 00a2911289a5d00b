//! Common Utilities
//!
//! Shared error type, result alias and path helpers.

pub mod error;
pub mod paths;
pub mod result;

pub use error::HubError;
pub use paths::{config_path, servehub_dir, DEFAULT_PROJECT_MANIFEST};
pub use result::HubResult;
