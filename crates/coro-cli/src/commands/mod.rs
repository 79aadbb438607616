//! CLI command implementations.

pub mod check;
pub mod nodes;
pub mod render;
