//! Error types for node construction, attribute writes and stream lookups.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, CoroError>;

/// Errors raised by the control plane.
///
/// Construction-time errors are fatal to the node being built: no partially
/// built node is ever returned. Attribute-write errors are fatal to that call
/// only and leave the node usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoroError {
    /// A broadcast argument normalized to zero values.
    #[error("argument '{0}' has no values to broadcast")]
    EmptyArgument(String),

    /// An auxiliary stream name the node kind does not produce.
    #[error("node '{node}' has no auxiliary stream named '{name}'")]
    KeyLookup {
        /// Kind name of the node that was queried.
        node: String,
        /// Requested stream name.
        name: String,
    },

    /// A container's size or duration does not fit the requested operation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A channel rejected a broadcast value during an attribute write.
    #[error("node '{node}' rejected '{param}' on voice {voice}: {reason}")]
    Propagation {
        /// Kind name of the node.
        node: String,
        /// Parameter being written.
        param: String,
        /// Voice index whose channel rejected the value.
        voice: usize,
        /// Why the value was rejected.
        reason: String,
    },

    /// A channel unit could not be built.
    #[error("failed to build voice {voice} of node '{node}': {reason}")]
    Construction {
        /// Kind name of the node.
        node: String,
        /// Voice index that failed.
        voice: usize,
        /// Why construction failed.
        reason: String,
    },

    /// A parameter name the node kind does not declare.
    #[error("node '{node}' has no parameter named '{param}'")]
    UnknownParam {
        /// Kind name of the node.
        node: String,
        /// Requested parameter name.
        param: String,
    },

    /// A write to a parameter that is only settable at construction.
    #[error("parameter '{param}' of node '{node}' is fixed at construction")]
    FixedParam {
        /// Kind name of the node.
        node: String,
        /// Parameter name.
        param: String,
    },

    /// A required constructor argument was not supplied.
    #[error("node '{node}' requires argument '{param}'")]
    MissingArgument {
        /// Kind name of the node.
        node: String,
        /// Parameter name.
        param: String,
    },
}

impl CoroError {
    /// Create a key lookup error.
    pub fn key_lookup(node: impl Into<String>, name: impl Into<String>) -> Self {
        CoroError::KeyLookup {
            node: node.into(),
            name: name.into(),
        }
    }

    /// Create an unknown parameter error.
    pub fn unknown_param(node: impl Into<String>, param: impl Into<String>) -> Self {
        CoroError::UnknownParam {
            node: node.into(),
            param: param.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        CoroError::Configuration(msg.into())
    }
}
