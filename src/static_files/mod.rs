//! Static file serving
//!
//! Maps request paths onto files below a document root. Lookups never
//! fail hard: anything that is missing, unreadable, not a regular file,
//! or outside the root is simply reported as not found.

pub mod resolver;

pub use resolver::{Lookup, ServedFile, StaticFiles};
