//! Patch file format.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use coro_core::{Matrix, Table};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::EngineSettings;

/// A patch: engine settings, containers and the nodes that use them.
///
/// Nodes are built in declaration order, so a node may only reference
/// nodes declared above it.
///
/// # TOML Format
///
/// ```toml
/// name = "Pulse"
///
/// [engine]
/// sample_rate = 48000
///
/// [[tables]]
/// id = "env"
/// shape = "hann"
/// size = 1024
///
/// [[nodes]]
/// id = "clock"
/// kind = "metro"
/// play = true
/// [nodes.params]
/// time = [0.25, 0.375]
///
/// [[nodes]]
/// id = "amp"
/// kind = "trigenv"
/// output = true
/// [nodes.params]
/// input = { node = "clock" }
/// table = { table = "env" }
/// dur = "200ms"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchConfig {
    /// Name of the patch.
    pub name: String,

    /// Optional description of the patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Tables shared by the nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableConfig>,

    /// Matrices shared by the nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matrices: Vec<MatrixConfig>,

    /// Nodes in build order.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

impl PatchConfig {
    /// Create an empty patch with default engine settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            engine: EngineSettings::default(),
            tables: Vec::new(),
            matrices: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the engine settings.
    pub fn with_engine(mut self, engine: EngineSettings) -> Self {
        self.engine = engine;
        self
    }

    /// Declare a table.
    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.tables.push(table);
        self
    }

    /// Declare a matrix.
    pub fn with_matrix(mut self, matrix: MatrixConfig) -> Self {
        self.matrices.push(matrix);
        self
    }

    /// Append a node.
    pub fn with_node(mut self, node: NodeConfig) -> Self {
        self.nodes.push(node);
        self
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        content.parse()
    }

    /// Save the patch to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the patch has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromStr for PatchConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

/// Initial contents of a declared table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TableShape {
    /// All zeros.
    #[default]
    Zero,
    /// One sine cycle.
    Sine,
    /// Hann window.
    Hann,
}

/// A `[[tables]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableConfig {
    /// Id used by `{ table = "id" }` references.
    pub id: String,

    /// Length in samples, ignored when `samples` is given.
    #[serde(default = "default_table_size")]
    pub size: usize,

    /// Initial contents.
    #[serde(default)]
    pub shape: TableShape,

    /// Explicit contents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<f32>,
}

fn default_table_size() -> usize {
    512
}

impl TableConfig {
    /// A zeroed table of `size` samples.
    pub fn new(id: impl Into<String>, size: usize) -> Self {
        Self {
            id: id.into(),
            size,
            shape: TableShape::Zero,
            samples: Vec::new(),
        }
    }

    /// Set the initial shape.
    pub fn with_shape(mut self, shape: TableShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set explicit contents.
    pub fn with_samples(mut self, samples: Vec<f32>) -> Self {
        self.size = samples.len();
        self.samples = samples;
        self
    }

    /// Allocate the table.
    pub fn build(&self, sample_rate: f32) -> coro_core::Result<Table> {
        if !self.samples.is_empty() {
            return Table::from_samples(self.samples.clone(), sample_rate);
        }
        match self.shape {
            TableShape::Zero => Table::new(self.size, sample_rate),
            TableShape::Sine => Table::sine(self.size, sample_rate),
            TableShape::Hann => Table::hann(self.size, sample_rate),
        }
    }
}

/// A `[[matrices]]` entry, zero-filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatrixConfig {
    /// Id used by `{ matrix = "id" }` references.
    pub id: String,
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl MatrixConfig {
    /// Declare a `width` by `height` matrix.
    pub fn new(id: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    /// Allocate the matrix.
    pub fn build(&self) -> coro_core::Result<Matrix> {
        Matrix::new(self.width, self.height)
    }
}

/// A `[[nodes]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// Unique id within the patch.
    pub id: String,

    /// Registry id of the node kind (e.g. `"metro"`).
    pub kind: String,

    /// Start the node after the patch is built.
    #[serde(default, skip_serializing_if = "is_false")]
    pub play: bool,

    /// Mix this node's voices into the rendered output.
    #[serde(default, skip_serializing_if = "is_false")]
    pub output: bool,

    /// Constructor arguments by parameter name.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

impl NodeConfig {
    /// Create a node entry with no arguments.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            play: false,
            output: false,
            params: BTreeMap::new(),
        }
    }

    /// Add an argument.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Start the node once built.
    pub fn playing(mut self) -> Self {
        self.play = true;
        self
    }

    /// Route the node to the rendered output.
    pub fn as_output(mut self) -> Self {
        self.output = true;
        self
    }
}

/// A parameter value in a patch file.
///
/// Plain TOML values map to numbers, flags and per-voice lists. Strings are
/// numbers with units (see [`parse_param_value`]). Inline tables reference
/// other nodes and declared containers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    /// `freq = 440`
    Number(f32),
    /// `loop = true`
    Flag(bool),
    /// `time = [0.25, 0.5]`, one value per voice
    List(Vec<f32>),
    /// `dur = "200ms"`
    Text(String),
    /// `input = { node = "clock" }` or `{ node = "rec", stream = "trig" }`
    Node {
        /// Id of the referenced node.
        node: String,
        /// Auxiliary stream name; the main output when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stream: Option<String>,
    },
    /// `table = { table = "env" }`
    Table {
        /// Id of the declared table.
        table: String,
    },
    /// `sources = { tables = ["a", "b"] }`
    Tables {
        /// Ids of the declared tables.
        tables: Vec<String>,
    },
    /// `matrix = { matrix = "grid" }`
    Matrix {
        /// Id of the declared matrix.
        matrix: String,
    },
    /// `sources = { matrices = ["a", "b"] }`
    Matrices {
        /// Ids of the declared matrices.
        matrices: Vec<String>,
    },
}

impl ParamValue {
    /// Main output of node `id`.
    pub fn node(id: impl Into<String>) -> Self {
        ParamValue::Node {
            node: id.into(),
            stream: None,
        }
    }

    /// Auxiliary stream `stream` of node `id`.
    pub fn stream(id: impl Into<String>, stream: impl Into<String>) -> Self {
        ParamValue::Node {
            node: id.into(),
            stream: Some(stream.into()),
        }
    }

    /// Declared table `id`.
    pub fn table(id: impl Into<String>) -> Self {
        ParamValue::Table { table: id.into() }
    }

    /// Declared tables, one per voice.
    pub fn tables<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        ParamValue::Tables {
            tables: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Declared matrix `id`.
    pub fn matrix(id: impl Into<String>) -> Self {
        ParamValue::Matrix { matrix: id.into() }
    }

    /// Declared matrices, one per voice.
    pub fn matrices<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        ParamValue::Matrices {
            matrices: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Number(v as f32)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Flag(b)
    }
}

impl From<Vec<f32>> for ParamValue {
    fn from(v: Vec<f32>) -> Self {
        ParamValue::List(v)
    }
}

impl<const N: usize> From<[f32; N]> for ParamValue {
    fn from(v: [f32; N]) -> Self {
        ParamValue::List(v.to_vec())
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

/// Parse a number with an optional unit.
///
/// | Suffix | Meaning |
/// |--------|---------|
/// | `ms` | milliseconds, to seconds |
/// | `s` | seconds |
/// | `kHz` | kilohertz, to Hz |
/// | `Hz` | hertz |
/// | `%` | percent, to 0-1 |
/// | `dB` | decibels, to linear gain |
///
/// Suffixes are case-insensitive.
///
/// ```rust
/// use coro_config::parse_param_value;
///
/// assert_eq!(parse_param_value("250ms"), Some(0.25));
/// assert_eq!(parse_param_value("1.5kHz"), Some(1500.0));
/// assert_eq!(parse_param_value("fast"), None);
/// ```
pub fn parse_param_value(value: &str) -> Option<f32> {
    // (suffix, multiplier, divisor)
    const UNITS: [(&str, f32, f32); 5] = [
        ("ms", 1.0, 1000.0),
        ("khz", 1000.0, 1.0),
        ("hz", 1.0, 1.0),
        ("s", 1.0, 1.0),
        ("%", 1.0, 100.0),
    ];

    let lower = value.trim().to_ascii_lowercase();
    if let Some(db) = lower.strip_suffix("db") {
        let db: f32 = db.trim().parse().ok()?;
        return Some(libm::powf(10.0, db / 20.0));
    }
    for (suffix, mul, div) in UNITS {
        if let Some(number) = lower.strip_suffix(suffix) {
            return number.trim().parse::<f32>().ok().map(|v| v * mul / div);
        }
    }
    lower.parse().ok()
}
