//! Common Result Type
//!
//! Type alias for servehub results.

use super::error::HubError;

/// Result type used across the servehub library.
pub type HubResult<T> = Result<T, HubError>;
