//! Domain types for documents, selections, and catch results.

pub mod document;
pub mod errors;
pub mod model;
