//! Shared helpers: MIME detection and route key manipulation.

pub mod mime;
pub mod path;
