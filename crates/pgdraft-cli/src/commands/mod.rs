//! CLI command implementations.

pub mod import;
pub mod resume;
pub mod validate;
