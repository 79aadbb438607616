//! Patch validation.
//!
//! Checks a [`PatchConfig`] against the node registry before anything is
//! built: ids are unique, kinds and parameters exist, required arguments are
//! present and every reference points at something declared earlier.
//!
//! # Example
//!
//! ```rust
//! use coro_config::{NodeConfig, ParamValue, PatchConfig, ValidationError, validate_patch};
//! use coro_registry::NodeRegistry;
//!
//! let patch = PatchConfig::new("Broken")
//!     .with_node(NodeConfig::new("count", "counter").with_param("input", ParamValue::node("clock")))
//!     .with_node(NodeConfig::new("clock", "metro"));
//!
//! let err = validate_patch(&patch, &NodeRegistry::new()).unwrap_err();
//! assert!(matches!(err, ValidationError::UnresolvedReference { .. }));
//! ```

use std::collections::HashSet;

use coro_core::{AuxKind, ParamDefault};
use coro_registry::{NodeDescriptor, NodeRegistry};
use thiserror::Error;

use crate::patch_config::{NodeConfig, ParamValue, PatchConfig, parse_param_value};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Two entries share an id.
    #[error("duplicate {what} id '{id}'")]
    DuplicateId {
        /// `"node"`, `"table"` or `"matrix"`.
        what: &'static str,
        /// The repeated id.
        id: String,
    },

    /// Engine settings are out of range.
    #[error("invalid engine settings: {0}")]
    Engine(String),

    /// The registry has no such kind.
    #[error("node '{node}' has unknown kind '{kind}'")]
    UnknownKind {
        /// Node id.
        node: String,
        /// Kind as written.
        kind: String,
    },

    /// The kind has no such parameter.
    #[error("unknown parameter '{param}' for node '{node}'")]
    UnknownParameter {
        /// Node id.
        node: String,
        /// Parameter name as written.
        param: String,
    },

    /// A parameter without a default was left out.
    #[error("node '{node}' requires parameter '{param}'")]
    MissingArgument {
        /// Node id.
        node: String,
        /// Parameter name.
        param: String,
    },

    /// A node reference is dangling or points forward.
    #[error("parameter '{param}' of node '{node}' refers to '{target}', which is not declared before it")]
    UnresolvedReference {
        /// Node id.
        node: String,
        /// Parameter name.
        param: String,
        /// Referenced id.
        target: String,
    },

    /// A table or matrix reference names nothing.
    #[error("parameter '{param}' of node '{node}' refers to undeclared {what} '{target}'")]
    UnknownContainer {
        /// Node id.
        node: String,
        /// Parameter name.
        param: String,
        /// `"table"` or `"matrix"`.
        what: &'static str,
        /// Referenced id.
        target: String,
    },

    /// The referenced node does not publish that auxiliary stream.
    #[error("node '{target}' has no stream '{stream}' (used by '{node}')")]
    UnknownStream {
        /// Node id holding the reference.
        node: String,
        /// Referenced node id.
        target: String,
        /// Stream name as written.
        stream: String,
    },

    /// Invalid parameter format.
    #[error("invalid format for parameter '{param}' of node '{node}': {reason}")]
    InvalidFormat {
        /// Node id.
        node: String,
        /// Parameter name.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a whole patch, collecting every problem found.
pub fn validate_patch(patch: &PatchConfig, registry: &NodeRegistry) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if let Err(e) = patch.engine.to_engine_config() {
        errors.push(ValidationError::Engine(e.to_string()));
    }

    let tables = unique_ids("table", patch.tables.iter().map(|t| t.id.as_str()), &mut errors);
    let matrices = unique_ids("matrix", patch.matrices.iter().map(|m| m.id.as_str()), &mut errors);

    // Kinds of the nodes declared so far, by id.
    let mut declared: Vec<(&str, Option<&NodeDescriptor>)> = Vec::new();
    for node in &patch.nodes {
        if declared.iter().any(|(id, _)| *id == node.id) {
            errors.push(ValidationError::DuplicateId {
                what: "node",
                id: node.id.clone(),
            });
        }
        let descriptor = registry.descriptor(&node.kind);
        match descriptor {
            Some(desc) => check_params(node, desc, &mut errors),
            None => errors.push(ValidationError::UnknownKind {
                node: node.id.clone(),
                kind: node.kind.clone(),
            }),
        }
        let context = Context {
            declared: &declared,
            tables: &tables,
            matrices: &matrices,
        };
        for (param, value) in &node.params {
            context.check_value(node, param, value, &mut errors);
        }
        declared.push((node.id.as_str(), descriptor));
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn unique_ids<'a>(
    what: &'static str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::DuplicateId {
                what,
                id: id.to_string(),
            });
        }
    }
    seen
}

fn check_params(node: &NodeConfig, desc: &NodeDescriptor, errors: &mut Vec<ValidationError>) {
    for param in node.params.keys() {
        if !desc.params.iter().any(|p| p.name == param.as_str()) {
            errors.push(ValidationError::UnknownParameter {
                node: node.id.clone(),
                param: param.clone(),
            });
        }
    }
    for spec in desc.params {
        if spec.default == ParamDefault::Required && !node.params.contains_key(spec.name) {
            errors.push(ValidationError::MissingArgument {
                node: node.id.clone(),
                param: spec.name.to_string(),
            });
        }
    }
}

struct Context<'a> {
    declared: &'a [(&'a str, Option<&'a NodeDescriptor>)],
    tables: &'a HashSet<&'a str>,
    matrices: &'a HashSet<&'a str>,
}

impl Context<'_> {
    fn check_value(
        &self,
        node: &NodeConfig,
        param: &str,
        value: &ParamValue,
        errors: &mut Vec<ValidationError>,
    ) {
        match value {
            ParamValue::Number(_) | ParamValue::Flag(_) | ParamValue::List(_) => {}
            ParamValue::Text(text) => {
                if parse_param_value(text).is_none() {
                    errors.push(ValidationError::InvalidFormat {
                        node: node.id.clone(),
                        param: param.to_string(),
                        reason: format!("'{text}' is not a number with a known unit"),
                    });
                }
            }
            ParamValue::Node { node: target, stream } => {
                self.check_node_ref(node, param, target, stream.as_deref(), errors);
            }
            ParamValue::Table { table } => {
                self.check_container(node, param, "table", self.tables, [table], errors);
            }
            ParamValue::Tables { tables } => {
                self.check_container(node, param, "table", self.tables, tables, errors);
            }
            ParamValue::Matrix { matrix } => {
                self.check_container(node, param, "matrix", self.matrices, [matrix], errors);
            }
            ParamValue::Matrices { matrices } => {
                self.check_container(node, param, "matrix", self.matrices, matrices, errors);
            }
        }
    }

    fn check_node_ref(
        &self,
        node: &NodeConfig,
        param: &str,
        target: &str,
        stream: Option<&str>,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some((_, desc)) = self.declared.iter().find(|(id, _)| *id == target) else {
            errors.push(ValidationError::UnresolvedReference {
                node: node.id.clone(),
                param: param.to_string(),
                target: target.to_string(),
            });
            return;
        };
        let (Some(stream), Some(desc)) = (stream, desc) else {
            return;
        };
        let published = AuxKind::from_name(stream).is_some_and(|kind| desc.aux.contains(&kind));
        if !published {
            errors.push(ValidationError::UnknownStream {
                node: node.id.clone(),
                target: target.to_string(),
                stream: stream.to_string(),
            });
        }
    }

    fn check_container<'s>(
        &self,
        node: &NodeConfig,
        param: &str,
        what: &'static str,
        known: &HashSet<&str>,
        ids: impl IntoIterator<Item = &'s String>,
        errors: &mut Vec<ValidationError>,
    ) {
        for id in ids {
            if !known.contains(id.as_str()) {
                errors.push(ValidationError::UnknownContainer {
                    node: node.id.clone(),
                    param: param.to_string(),
                    what,
                    target: id.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch_config::{MatrixConfig, TableConfig};
    use crate::settings::EngineSettings;

    fn registry() -> NodeRegistry {
        NodeRegistry::new()
    }

    fn recorder_patch() -> PatchConfig {
        PatchConfig::new("Rec")
            .with_table(TableConfig::new("buf", 64))
            .with_node(NodeConfig::new("src", "sig").with_param("value", 0.5))
            .with_node(
                NodeConfig::new("rec", "tablerec")
                    .with_param("input", ParamValue::node("src"))
                    .with_param("table", ParamValue::table("buf")),
            )
            .with_node(
                NodeConfig::new("count", "counter")
                    .with_param("input", ParamValue::stream("rec", "trig"))
                    .with_param("max", "4"),
            )
    }

    #[test]
    fn test_valid_patch() {
        assert_eq!(validate_patch(&recorder_patch(), &registry()), Ok(()));
    }

    #[test]
    fn test_unknown_kind() {
        let patch = PatchConfig::new("p").with_node(NodeConfig::new("fx", "reverb"));
        assert_eq!(
            validate_patch(&patch, &registry()),
            Err(ValidationError::UnknownKind {
                node: "fx".to_string(),
                kind: "reverb".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_parameter() {
        let patch =
            PatchConfig::new("p").with_node(NodeConfig::new("s", "sig").with_param("gain", 1.0));
        assert!(matches!(
            validate_patch(&patch, &registry()),
            Err(ValidationError::UnknownParameter { ref param, .. }) if param == "gain"
        ));
    }

    #[test]
    fn test_missing_argument() {
        let patch = PatchConfig::new("p").with_node(NodeConfig::new("o", "osc"));
        assert!(matches!(
            validate_patch(&patch, &registry()),
            Err(ValidationError::MissingArgument { ref param, .. }) if param == "table"
        ));
    }

    #[test]
    fn test_forward_reference() {
        let patch = PatchConfig::new("p")
            .with_node(
                NodeConfig::new("count", "counter").with_param("input", ParamValue::node("clock")),
            )
            .with_node(NodeConfig::new("clock", "metro"));
        assert!(matches!(
            validate_patch(&patch, &registry()),
            Err(ValidationError::UnresolvedReference { ref target, .. }) if target == "clock"
        ));
    }

    #[test]
    fn test_unknown_stream() {
        let patch = PatchConfig::new("p")
            .with_node(NodeConfig::new("clock", "metro"))
            .with_node(
                NodeConfig::new("count", "counter")
                    .with_param("input", ParamValue::stream("clock", "trig")),
            );
        assert!(matches!(
            validate_patch(&patch, &registry()),
            Err(ValidationError::UnknownStream { ref target, .. }) if target == "clock"
        ));
    }

    #[test]
    fn test_unknown_containers() {
        let patch = PatchConfig::new("p")
            .with_table(TableConfig::new("a", 8))
            .with_matrix(MatrixConfig::new("m", 2, 2))
            .with_node(NodeConfig::new("src", "sig"))
            .with_node(
                NodeConfig::new("morph", "tablemorph")
                    .with_param("input", ParamValue::node("src"))
                    .with_param("table", ParamValue::table("a"))
                    .with_param("sources", ParamValue::tables(["a", "b"])),
            )
            .with_node(
                NodeConfig::new("read", "matrixpointer")
                    .with_param("matrix", ParamValue::matrix("grid"))
                    .with_param("x", ParamValue::node("src"))
                    .with_param("y", ParamValue::node("src")),
            );
        let Err(ValidationError::Multiple(errors)) = validate_patch(&patch, &registry()) else {
            panic!("expected two errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::UnknownContainer { .. })));
    }

    #[test]
    fn test_duplicate_ids() {
        let patch = PatchConfig::new("p")
            .with_table(TableConfig::new("t", 8))
            .with_table(TableConfig::new("t", 8))
            .with_node(NodeConfig::new("a", "sig"))
            .with_node(NodeConfig::new("a", "sig"));
        let Err(ValidationError::Multiple(errors)) = validate_patch(&patch, &registry()) else {
            panic!("expected two errors");
        };
        assert!(errors.contains(&ValidationError::DuplicateId {
            what: "table",
            id: "t".to_string()
        }));
        assert!(errors.contains(&ValidationError::DuplicateId {
            what: "node",
            id: "a".to_string()
        }));
    }

    #[test]
    fn test_bad_text_and_engine() {
        let patch = PatchConfig::new("p")
            .with_engine(EngineSettings {
                block_size: 0,
                ..EngineSettings::default()
            })
            .with_node(NodeConfig::new("m", "metro").with_param("time", "soon"));
        let Err(ValidationError::Multiple(errors)) = validate_patch(&patch, &registry()) else {
            panic!("expected two errors");
        };
        assert!(matches!(errors[0], ValidationError::Engine(_)));
        assert!(matches!(errors[1], ValidationError::InvalidFormat { .. }));
        assert!(ValidationError::Multiple(errors).to_string().contains("; "));
    }
}
