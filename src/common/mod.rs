//! Common types and utilities shared across the container, package, and
//! navigation layers.

// Submodule declarations
pub mod bom;
pub mod error;
pub mod id;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
