//! Engine settings and patch files for coro.
//!
//! A patch is a TOML document declaring engine settings, shared tables and
//! matrices, and a list of nodes with their arguments. This crate loads and
//! saves patches, validates them against the node registry and builds them
//! into a running engine.
//!
//! # Features
//!
//! - **Patch Files**: Load and save patches as TOML
//! - **Validation**: Unknown kinds, parameters and references are reported together
//! - **Building**: Resolve node, stream, table and matrix references in declaration order
//! - **Rendering**: Process blocks offline and mix the output nodes to mono
//!
//! # Example
//!
//! ```rust
//! use coro_config::{NodeConfig, ParamValue, Patch, PatchConfig, TableConfig, TableShape};
//! use coro_registry::NodeRegistry;
//!
//! let config = PatchConfig::new("Pulse")
//!     .with_table(TableConfig::new("env", 1024).with_shape(TableShape::Hann))
//!     .with_node(NodeConfig::new("clock", "metro").with_param("time", [0.25, 0.375]).playing())
//!     .with_node(
//!         NodeConfig::new("amp", "trigenv")
//!             .with_param("input", ParamValue::node("clock"))
//!             .with_param("table", ParamValue::table("env"))
//!             .with_param("dur", "200ms")
//!             .as_output(),
//!     );
//!
//! let patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
//! let audio = patch.render(patch.blocks_for(0.5));
//! assert!(audio.iter().any(|&s| s > 0.0));
//! ```

mod error;
mod patch;
mod patch_config;
mod settings;

/// Patch validation against the node registry.
pub mod validation;

pub use error::ConfigError;
pub use patch::Patch;
pub use patch_config::{
    MatrixConfig, NodeConfig, ParamValue, PatchConfig, TableConfig, TableShape, parse_param_value,
};
pub use settings::EngineSettings;
pub use validation::{ValidationError, ValidationResult, validate_patch};

/// Re-export commonly used types from coro-registry
pub use coro_registry::{NodeCategory, NodeDescriptor, NodeRegistry};
