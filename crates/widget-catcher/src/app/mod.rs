//! Application layer orchestrating domain logic and infrastructure.

pub mod catch;
pub mod expander;
pub mod feedback;
pub mod messaging;
pub mod usage;
