//! relalg CLI support
//!
//! The pieces around the interpreter that a front end needs: loading and
//! exporting named databases, and rendering execution traces as text tables,
//! highlighted query text and Mermaid diagrams.

pub mod database;
pub mod render;

// Re-exports for convenience
pub use database::{Catalog, Database, DatabaseError};
pub use render::HighlightStyle;
