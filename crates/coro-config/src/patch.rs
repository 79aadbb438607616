//! Building and rendering patches.

use std::collections::HashMap;
use std::fmt;

use coro_core::{AnyNode, Engine, EngineConfig, ExpandableValue, Matrix, Table};
use coro_registry::{NodeArgs, NodeRegistry};

use crate::error::ConfigError;
use crate::patch_config::{NodeConfig, ParamValue, PatchConfig, parse_param_value};
use crate::validation::validate_patch;

struct PatchNode {
    id: String,
    node: Box<dyn AnyNode>,
    output: bool,
}

/// A built patch: a live engine with its containers and nodes.
///
/// # Example
///
/// ```rust
/// use coro_config::{NodeConfig, Patch, PatchConfig};
/// use coro_registry::NodeRegistry;
///
/// let config = PatchConfig::new("Drone")
///     .with_node(NodeConfig::new("dc", "sig").with_param("value", [0.25, 0.5]).as_output());
///
/// let patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
/// let audio = patch.render(2);
/// assert_eq!(audio.len(), 2 * patch.engine().config().block_size);
/// assert!(audio.iter().all(|&s| s == 0.75));
/// ```
pub struct Patch {
    name: String,
    engine: Engine,
    tables: HashMap<String, Table>,
    matrices: HashMap<String, Matrix>,
    nodes: Vec<PatchNode>,
}

impl Patch {
    /// Validate `config`, then create its engine, containers and nodes.
    ///
    /// Nodes are created in declaration order; those marked `play` are
    /// started once every node exists.
    pub fn build(config: &PatchConfig, registry: &NodeRegistry) -> Result<Self, ConfigError> {
        validate_patch(config, registry)?;

        let engine_config = config.engine.to_engine_config()?;
        let mut patch = Self {
            name: config.name.clone(),
            engine: Engine::new(engine_config)?,
            tables: HashMap::new(),
            matrices: HashMap::new(),
            nodes: Vec::with_capacity(config.nodes.len()),
        };

        for table in &config.tables {
            let built = table.build(engine_config.sample_rate)?;
            patch.tables.insert(table.id.clone(), built);
        }
        for matrix in &config.matrices {
            patch.matrices.insert(matrix.id.clone(), matrix.build()?);
        }

        for node_config in &config.nodes {
            let args = patch.resolve_args(node_config)?;
            let node = registry.create(&node_config.kind, &patch.engine, args)?;
            patch.nodes.push(PatchNode {
                id: node_config.id.clone(),
                node,
                output: node_config.output,
            });
        }

        for (entry, node_config) in patch.nodes.iter().zip(&config.nodes) {
            if node_config.play {
                entry.node.play();
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "patch_build: '{}' with {} nodes, {} tables, {} matrices",
            patch.name,
            patch.nodes.len(),
            patch.tables.len(),
            patch.matrices.len()
        );

        Ok(patch)
    }

    fn resolve_args(&self, config: &NodeConfig) -> Result<NodeArgs, ConfigError> {
        config
            .params
            .iter()
            .map(|(param, value)| Ok((param.clone(), self.resolve(config, param, value)?)))
            .collect()
    }

    fn resolve(
        &self,
        config: &NodeConfig,
        param: &str,
        value: &ParamValue,
    ) -> Result<ExpandableValue, ConfigError> {
        let missing = |what: &str, id: &str| {
            ConfigError::invalid_param(&config.id, param, format!("no {what} named '{id}'"))
        };
        let value = match value {
            ParamValue::Number(v) => ExpandableValue::from(*v),
            ParamValue::Flag(b) => ExpandableValue::from(*b),
            ParamValue::List(values) => ExpandableValue::from(values.clone()),
            ParamValue::Text(text) => parse_param_value(text)
                .map(ExpandableValue::from)
                .ok_or_else(|| ConfigError::invalid_param(&config.id, param, "not a number"))?,
            ParamValue::Node { node, stream } => {
                let target = self.node(node).ok_or_else(|| missing("node", node))?;
                match stream {
                    Some(stream) => ExpandableValue::from(target.stream(stream)?),
                    None => ExpandableValue::from(target.output()),
                }
            }
            ParamValue::Table { table } => {
                ExpandableValue::from(self.table(table).ok_or_else(|| missing("table", table))?)
            }
            ParamValue::Tables { tables } => ExpandableValue::from(
                tables
                    .iter()
                    .map(|id| self.table(id).cloned().ok_or_else(|| missing("table", id)))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ParamValue::Matrix { matrix } => ExpandableValue::from(
                self.matrix(matrix).ok_or_else(|| missing("matrix", matrix))?,
            ),
            ParamValue::Matrices { matrices } => ExpandableValue::from(
                matrices
                    .iter()
                    .map(|id| self.matrix(id).cloned().ok_or_else(|| missing("matrix", id)))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(value)
    }

    /// Patch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The engine driving the patch.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Engine settings in effect.
    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    /// Node by id.
    pub fn node(&self, id: &str) -> Option<&dyn AnyNode> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.node.as_ref())
    }

    /// Mutable node by id, for live attribute changes.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut dyn AnyNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| n.node.as_mut() as &mut dyn AnyNode)
    }

    /// Node ids in build order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    /// Declared table by id.
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.get(id)
    }

    /// Declared matrix by id.
    pub fn matrix(&self, id: &str) -> Option<&Matrix> {
        self.matrices.get(id)
    }

    /// Number of blocks covering `seconds`, to the nearest sample.
    pub fn blocks_for(&self, seconds: f32) -> usize {
        let config = self.config();
        let samples = libm::roundf(seconds.max(0.0) * config.sample_rate) as usize;
        samples.div_ceil(config.block_size)
    }

    /// Process `blocks` blocks and return the mono mix of the output nodes.
    ///
    /// Every voice of every node marked `output` is summed.
    pub fn render(&self, blocks: usize) -> Vec<f32> {
        let block_size = self.config().block_size;
        let mut out = Vec::with_capacity(blocks * block_size);
        let mut scratch = vec![0.0; block_size];
        let outputs: Vec<_> = self
            .nodes
            .iter()
            .filter(|n| n.output)
            .map(|n| (n.node.output(), n.node.voice_count()))
            .collect();

        for _ in 0..blocks {
            self.engine.process_block();
            let start = out.len();
            out.resize(start + block_size, 0.0);
            for (source, voices) in &outputs {
                for voice in 0..*voices {
                    source.read(voice, &mut scratch);
                    for (mix, s) in out[start..].iter_mut().zip(&scratch) {
                        *mix += s;
                    }
                }
            }
        }
        out
    }
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("name", &self.name)
            .field("nodes", &self.nodes.iter().map(|n| &n.id).collect::<Vec<_>>())
            .field("tables", &self.tables.len())
            .field("matrices", &self.matrices.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch_config::TableConfig;
    use crate::settings::EngineSettings;
    use coro_core::SetOutcome;

    fn small_engine() -> EngineSettings {
        EngineSettings {
            sample_rate: 8000,
            block_size: 8,
            ..EngineSettings::default()
        }
    }

    #[test]
    fn test_build_rejects_invalid_patch() {
        let config = PatchConfig::new("bad").with_node(NodeConfig::new("x", "reverb"));
        assert!(matches!(
            Patch::build(&config, &NodeRegistry::new()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_render_mixes_only_outputs() {
        let config = PatchConfig::new("mix")
            .with_engine(small_engine())
            .with_node(NodeConfig::new("a", "sig").with_param("value", 0.25).as_output())
            .with_node(NodeConfig::new("b", "sig").with_param("value", 0.5))
            .with_node(NodeConfig::new("c", "sig").with_param("value", "50%").as_output());
        let patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
        assert_eq!(patch.render(1), vec![0.75; 8]);
        assert_eq!(patch.node_ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_play_flag_starts_recorder() {
        let config = PatchConfig::new("rec")
            .with_engine(small_engine())
            .with_table(TableConfig::new("buf", 8))
            .with_node(NodeConfig::new("src", "sig").with_param("value", 0.5))
            .with_node(
                NodeConfig::new("rec", "tablerec")
                    .playing()
                    .with_param("input", ParamValue::node("src"))
                    .with_param("table", ParamValue::table("buf")),
            );
        let patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
        assert!(patch.node("rec").unwrap().is_playing());
        patch.render(1);
        assert_eq!(patch.table("buf").unwrap().snapshot(), vec![0.5; 8]);
    }

    #[test]
    fn test_live_attribute_change() {
        let config = PatchConfig::new("live")
            .with_engine(small_engine())
            .with_node(NodeConfig::new("dc", "sig").with_param("value", 1.0).as_output());
        let mut patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
        let outcome = patch
            .node_mut("dc")
            .unwrap()
            .set("value", ExpandableValue::from(0.0_f32))
            .unwrap();
        assert_eq!(outcome, SetOutcome::Applied);
        assert!(patch.node_mut("nope").is_none());
    }

    #[test]
    fn test_blocks_for() {
        let config = PatchConfig::new("t").with_engine(small_engine());
        let patch = Patch::build(&config, &NodeRegistry::new()).unwrap();
        assert_eq!(patch.blocks_for(0.001), 1);
        assert_eq!(patch.blocks_for(0.0015), 2);
        assert_eq!(patch.blocks_for(-1.0), 0);
        assert!(patch.render(0).is_empty());
    }
}
