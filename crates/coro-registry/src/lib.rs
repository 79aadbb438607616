//! Node registry and factory for coro node kinds.
//!
//! This crate provides a centralized registry for discovering and building
//! nodes by id. Patches and the CLI use it to turn a kind name from a file
//! into a live node, and to list parameter tables for documentation.
//!
//! # Features
//!
//! - **Node Discovery**: List every kind with its description and category
//! - **Factory Pattern**: Build nodes by id at runtime as `Box<dyn AnyNode>`
//! - **Category System**: Kinds grouped as sources, triggers, tables, matrices
//!   and random generators
//! - **Parameter Info**: Each descriptor carries the kind's parameter table
//!
//! # Example
//!
//! ```rust
//! use coro_core::{Engine, EngineConfig, ExpandableValue, Table};
//! use coro_registry::{NodeCategory, NodeRegistry};
//!
//! let registry = NodeRegistry::new();
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//!
//! for node in registry.nodes_in_category(NodeCategory::Random) {
//!     println!("{}: {}", node.name, node.description);
//! }
//!
//! let args = vec![
//!     ("table".to_string(), ExpandableValue::from(Table::sine(512, 48000.0).unwrap())),
//!     ("freq".to_string(), ExpandableValue::from([220.0, 330.0])),
//! ];
//! let osc = registry.create("osc", &engine, args).unwrap();
//! assert_eq!(osc.voice_count(), 2);
//! ```

use coro_core::{AnyNode, AuxKind, CoroError, Engine, ExpandableValue, Node, NodeKind, ParamSpec};
use coro_nodes::{
    ChoiceKind, CounterKind, LookupKind, MatrixMorphKind, MatrixPointerKind, MatrixRecKind,
    MatrixRecLoopKind, MetroKind, OscKind, OscLoopKind, PointerKind, RandIntKind, RandhKind,
    RandiKind, SelectKind, SigKind, TableIndexKind, TableMorphKind, TablePutKind, TableReadKind,
    TableRecKind, TableScaleKind, TrigChoiceKind, TrigEnvKind, TrigRandKind, TrigTableRecKind,
    UrnKind,
};
use thiserror::Error;

/// Named constructor arguments, in any order.
pub type NodeArgs = Vec<(String, ExpandableValue)>;

/// Category of node kind for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Constant and stream-following sources
    Source,
    /// Trigger generators and trigger-driven nodes
    Trigger,
    /// Table readers, recorders and transforms
    Table,
    /// Matrix readers, recorders and transforms
    Matrix,
    /// Periodic random generators
    Random,
}

impl NodeCategory {
    /// Every category, in display order.
    pub const ALL: [NodeCategory; 5] = [
        NodeCategory::Source,
        NodeCategory::Trigger,
        NodeCategory::Table,
        NodeCategory::Matrix,
        NodeCategory::Random,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Source",
            NodeCategory::Trigger => "Trigger",
            NodeCategory::Table => "Table",
            NodeCategory::Matrix => "Matrix",
            NodeCategory::Random => "Random",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Constant values and stream followers",
            NodeCategory::Trigger => "Metronomes, counters and per-trigger generators",
            NodeCategory::Table => "Table oscillators, readers, recorders and transforms",
            NodeCategory::Matrix => "Matrix readers, recorders and morphing",
            NodeCategory::Random => "Interpolated, held and drawn random values",
        }
    }
}

/// Describes a node kind in the registry.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Unique identifier for the kind (lowercase, no spaces).
    pub id: &'static str,
    /// Kind name as reported by nodes.
    pub name: &'static str,
    /// Brief description of the kind.
    pub description: &'static str,
    /// Category for organization.
    pub category: NodeCategory,
    /// Positional parameter table.
    pub params: &'static [ParamSpec],
    /// Auxiliary streams the kind publishes.
    pub aux: &'static [AuxKind],
}

/// Errors from building nodes through the registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No kind is registered under the id.
    #[error("unknown node kind: {0}")]
    UnknownNode(String),

    /// The kind rejected its arguments.
    #[error("failed to create '{id}': {source}")]
    Node {
        /// Registry id of the kind.
        id: String,
        /// Underlying construction error.
        #[source]
        source: CoroError,
    },
}

/// Factory function type for creating nodes.
type NodeFactory = fn(&Engine, NodeArgs) -> coro_core::Result<Box<dyn AnyNode>>;

fn build<K: NodeKind + Default + 'static>(
    engine: &Engine,
    args: NodeArgs,
) -> coro_core::Result<Box<dyn AnyNode>> {
    Ok(Box::new(Node::new(engine, K::default(), args)?))
}

/// Internal entry in the registry.
struct RegistryEntry {
    descriptor: NodeDescriptor,
    factory: NodeFactory,
}

/// Registry of all available node kinds.
///
/// Every built-in kind is registered by [`NodeRegistry::new`].
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Create a new registry with all built-in kinds registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(27),
        };
        registry.register_builtin_nodes();
        registry
    }

    fn register_builtin_nodes(&mut self) {
        use NodeCategory::{Matrix, Random, Source, Table, Trigger};

        self.register::<SigKind>("sig", "Constant value or stream follower", Source);

        self.register::<MetroKind>("metro", "Periodic trigger generator", Trigger);
        self.register::<TrigRandKind>("trigrand", "New random value on each trigger", Trigger);
        self.register::<TrigChoiceKind>("trigchoice", "Random list element on each trigger", Trigger);
        self.register::<TrigEnvKind>("trigenv", "Envelope table read on each trigger", Trigger);
        self.register::<CounterKind>("counter", "Counts triggers between min and max", Trigger);
        self.register::<SelectKind>("select", "Trigger when an integer stream hits a value", Trigger);

        self.register::<OscKind>("osc", "Wavetable oscillator", Table);
        self.register::<OscLoopKind>("oscloop", "Wavetable oscillator with output feedback", Table);
        self.register::<TableReadKind>("tableread", "One-shot or looping table player", Table);
        self.register::<PointerKind>("pointer", "Table reader driven by a position stream", Table);
        self.register::<TableIndexKind>("tableindex", "Table sample at an integer position", Table);
        self.register::<LookupKind>("lookup", "Transfer function over a table", Table);
        self.register::<TableRecKind>("tablerec", "Records a stream into a table", Table);
        self.register::<TrigTableRecKind>("trigtablerec", "Records into a table on each trigger", Table);
        self.register::<TablePutKind>("tableput", "Writes new stream values into a table", Table);
        self.register::<TableMorphKind>("tablemorph", "Morphs between tables into a target", Table);
        self.register::<TableScaleKind>("tablescale", "Scaled copy of a table", Table);

        self.register::<MatrixRecKind>("matrixrec", "Records a stream into a matrix", Matrix);
        self.register::<MatrixRecLoopKind>("matrixrecloop", "Records into a matrix in a loop", Matrix);
        self.register::<MatrixPointerKind>("matrixpointer", "Bilinear matrix reader", Matrix);
        self.register::<MatrixMorphKind>("matrixmorph", "Morphs between matrices into a target", Matrix);

        self.register::<RandiKind>("randi", "Interpolated random values", Random);
        self.register::<RandhKind>("randh", "Held random values", Random);
        self.register::<RandIntKind>("randint", "Held random integers", Random);
        self.register::<ChoiceKind>("choice", "Random list element at a rate", Random);
        self.register::<UrnKind>("urn", "Integers drawn without repetition", Random);
    }

    /// Register a node kind with the registry.
    fn register<K: NodeKind + Default + 'static>(
        &mut self,
        id: &'static str,
        description: &'static str,
        category: NodeCategory,
    ) {
        let kind = K::default();
        self.entries.push(RegistryEntry {
            descriptor: NodeDescriptor {
                id,
                name: kind.name(),
                description,
                category,
                params: kind.params(),
                aux: kind.aux_streams(),
            },
            factory: build::<K>,
        });
    }

    /// Returns descriptors for all registered kinds.
    pub fn all_nodes(&self) -> Vec<&NodeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for kinds in a specific category.
    pub fn nodes_in_category(&self, category: NodeCategory) -> Vec<&NodeDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by id or kind name, ignoring case.
    pub fn descriptor(&self, id: &str) -> Option<&NodeDescriptor> {
        self.entry(id).map(|e| &e.descriptor)
    }

    fn entry(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| {
            e.descriptor.id.eq_ignore_ascii_case(id) || e.descriptor.name.eq_ignore_ascii_case(id)
        })
    }

    /// Build a node by id and register it with `engine`.
    pub fn create(
        &self,
        id: &str,
        engine: &Engine,
        args: NodeArgs,
    ) -> Result<Box<dyn AnyNode>, RegistryError> {
        let entry = self
            .entry(id)
            .ok_or_else(|| RegistryError::UnknownNode(id.to_string()))?;
        (entry.factory)(engine, args).map_err(|source| RegistryError::Node {
            id: entry.descriptor.id.to_string(),
            source,
        })
    }

    /// Find a parameter slot by name for a given kind, ignoring case.
    pub fn param_index_by_name(&self, id: &str, param_name: &str) -> Option<usize> {
        self.descriptor(id)?
            .params
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(param_name))
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
