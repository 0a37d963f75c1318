//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`route`]: route key utilities (`join_route`, `strip_leading_slash`)

pub mod route;

pub use route::{join_route, strip_leading_slash};
