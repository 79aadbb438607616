//! Parameter tables: what each argument slot of a node kind accepts.
//!
//! Every node kind declares a fixed, ordered list of [`ParamSpec`]s. The slot
//! order is the constructor's positional order and also the index passed to
//! [`ChannelUnit::set_param`](crate::ChannelUnit::set_param). Each spec
//! carries:
//!
//! - [`ParamDomain`]: which resolved values the slot accepts, and the legal range
//! - [`ParamDefault`]: the value used when the constructor omits the argument
//! - [`ParamFlags`]: broadcast and propagation behaviour (fixed, whole-list, ignored, post mul/add)
//!
//! # Example
//!
//! ```rust
//! use coro_core::{ParamSpec, VoiceValue};
//!
//! const FREQ: ParamSpec = ParamSpec::number("freq", "Frequency in Hz", 0.0, 20000.0, 440.0);
//!
//! assert!(FREQ.validate(&VoiceValue::Number(1000.0)).is_ok());
//! assert!(FREQ.validate(&VoiceValue::Number(-1.0)).is_err());
//! ```

use crate::value::{ExpandableValue, VoiceValue};

/// Values a parameter slot accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDomain {
    /// Number (or audio-rate stream) within `[min, max]`.
    Number {
        /// Smallest legal value.
        min: f32,
        /// Largest legal value.
        max: f32,
    },
    /// Whole number (or stream) within `[min, max]`.
    Integer {
        /// Smallest legal value.
        min: i32,
        /// Largest legal value.
        max: i32,
    },
    /// Boolean switch; numbers are read as non-zero.
    Flag,
    /// Live input from another producer, routed through an input fader.
    Input,
    /// One table.
    Table,
    /// One matrix.
    Matrix,
    /// Whole list of numbers.
    List,
    /// Whole list of tables.
    TableList,
    /// Whole list of matrices.
    MatrixList,
}

/// Default used when a constructor omits the argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    /// The argument must be supplied.
    Required,
    /// Numeric default.
    Number(f32),
    /// Flag default.
    Flag(bool),
}

/// Broadcast and propagation behaviour of a slot.
///
/// Use [`union`](Self::union) to combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Settable at construction only.
    pub const FIXED: Self = Self(1 << 0);
    /// Handed to every voice whole instead of being expanded.
    pub const WHOLE: Self = Self(1 << 1);
    /// Accepted but has no effect on this node kind.
    pub const IGNORED: Self = Self(1 << 2);
    /// Multiplies the unit's output after processing.
    pub const POST_MUL: Self = Self(1 << 3);
    /// Added to the unit's output after processing.
    pub const POST_ADD: Self = Self(1 << 4);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Description of one parameter slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Attribute name, lowercase.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Accepted values.
    pub domain: ParamDomain,
    /// Constructor default.
    pub default: ParamDefault,
    /// Behaviour flags.
    pub flags: ParamFlags,
}

impl ParamSpec {
    /// Numeric slot with a range and default.
    pub const fn number(
        name: &'static str,
        description: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            description,
            domain: ParamDomain::Number { min, max },
            default: ParamDefault::Number(default),
            flags: ParamFlags::NONE,
        }
    }

    /// Integer slot with a range and default.
    pub const fn integer(
        name: &'static str,
        description: &'static str,
        min: i32,
        max: i32,
        default: i32,
    ) -> Self {
        Self {
            name,
            description,
            domain: ParamDomain::Integer { min, max },
            default: ParamDefault::Number(default as f32),
            flags: ParamFlags::NONE,
        }
    }

    /// Boolean slot.
    pub const fn flag(name: &'static str, description: &'static str, default: bool) -> Self {
        Self {
            name,
            description,
            domain: ParamDomain::Flag,
            default: ParamDefault::Flag(default),
            flags: ParamFlags::NONE,
        }
    }

    /// Required live input.
    pub const fn input(name: &'static str, description: &'static str) -> Self {
        Self::required(name, description, ParamDomain::Input)
    }

    /// Required container or list slot.
    pub const fn required(
        name: &'static str,
        description: &'static str,
        domain: ParamDomain,
    ) -> Self {
        Self {
            name,
            description,
            domain,
            default: ParamDefault::Required,
            flags: ParamFlags::NONE,
        }
    }

    /// Output multiplier, applied after the unit runs.
    pub const fn mul() -> Self {
        Self {
            name: "mul",
            description: "Output multiplier",
            domain: ParamDomain::Number {
                min: f32::NEG_INFINITY,
                max: f32::INFINITY,
            },
            default: ParamDefault::Number(1.0),
            flags: ParamFlags::POST_MUL,
        }
    }

    /// Output offset, applied after the multiplier.
    pub const fn add() -> Self {
        Self {
            name: "add",
            description: "Output offset",
            domain: ParamDomain::Number {
                min: f32::NEG_INFINITY,
                max: f32::INFINITY,
            },
            default: ParamDefault::Number(0.0),
            flags: ParamFlags::POST_ADD,
        }
    }

    /// A numeric slot this kind accepts but ignores (sinks have no output to scale).
    pub const fn ignored(name: &'static str, default: f32) -> Self {
        Self {
            name,
            description: "Not applicable to this node kind",
            domain: ParamDomain::Number {
                min: f32::NEG_INFINITY,
                max: f32::INFINITY,
            },
            default: ParamDefault::Number(default),
            flags: ParamFlags::IGNORED,
        }
    }

    /// Add flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    /// Settable at construction only.
    pub const fn is_fixed(&self) -> bool {
        self.flags.contains(ParamFlags::FIXED)
    }

    /// Handed to voices whole.
    pub const fn is_whole(&self) -> bool {
        self.flags.contains(ParamFlags::WHOLE)
    }

    /// Accepted but ignored.
    pub const fn is_ignored(&self) -> bool {
        self.flags.contains(ParamFlags::IGNORED)
    }

    /// Live input slot.
    pub const fn is_input(&self) -> bool {
        matches!(self.domain, ParamDomain::Input)
    }

    /// Default as an argument value, if the slot has one.
    pub fn default_value(&self) -> Option<ExpandableValue> {
        match self.default {
            ParamDefault::Required => None,
            ParamDefault::Number(v) => Some(ExpandableValue::from(v)),
            ParamDefault::Flag(b) => Some(ExpandableValue::from(b)),
        }
    }

    /// Check one resolved voice value against the slot's domain.
    ///
    /// Returns a reason string on rejection; callers wrap it in the error
    /// kind that fits the context (construction or propagation).
    pub fn validate(&self, value: &VoiceValue) -> Result<(), String> {
        match (self.domain, value) {
            (ParamDomain::Number { .. } | ParamDomain::Integer { .. }, VoiceValue::Stream(_)) => {
                Ok(())
            }
            (ParamDomain::Number { min, max }, VoiceValue::Number(v)) => check_range(*v, min, max),
            (
                ParamDomain::Number { .. } | ParamDomain::Integer { .. } | ParamDomain::Flag,
                VoiceValue::Flag(_),
            ) => Ok(()),
            (ParamDomain::Integer { min, max }, VoiceValue::Number(v)) => {
                check_range(*v, min as f32, max as f32)
            }
            (ParamDomain::Flag, VoiceValue::Number(_)) => Ok(()),
            (ParamDomain::Input, VoiceValue::Stream(_)) => Ok(()),
            (ParamDomain::Table, v) if v.as_table().is_some() => Ok(()),
            (ParamDomain::Matrix, v) if v.as_matrix().is_some() => Ok(()),
            (ParamDomain::List, VoiceValue::List(list)) => {
                if list.is_empty() {
                    Err("list is empty".to_string())
                } else if list.iter().any(|v| !v.is_finite()) {
                    Err("list contains a non-finite value".to_string())
                } else {
                    Ok(())
                }
            }
            (ParamDomain::TableList, VoiceValue::Containers(c)) => {
                if c.is_empty() {
                    Err("table list is empty".to_string())
                } else if c.iter().all(|c| c.as_table().is_some()) {
                    Ok(())
                } else {
                    Err("table list contains a matrix".to_string())
                }
            }
            (ParamDomain::MatrixList, VoiceValue::Containers(c)) => {
                if c.is_empty() {
                    Err("matrix list is empty".to_string())
                } else if c.iter().all(|c| c.as_matrix().is_some()) {
                    Ok(())
                } else {
                    Err("matrix list contains a table".to_string())
                }
            }
            (domain, v) => Err(format!(
                "expected {}, got {}",
                domain_name(domain),
                v.kind_name()
            )),
        }
    }
}

fn check_range(v: f32, min: f32, max: f32) -> Result<(), String> {
    if v.is_nan() {
        return Err("value is NaN".to_string());
    }
    if v < min || v > max {
        return Err(format!("value {v} outside [{min}, {max}]"));
    }
    Ok(())
}

fn domain_name(domain: ParamDomain) -> &'static str {
    match domain {
        ParamDomain::Number { .. } => "a number or stream",
        ParamDomain::Integer { .. } => "an integer or stream",
        ParamDomain::Flag => "a flag",
        ParamDomain::Input => "a stream",
        ParamDomain::Table => "a table",
        ParamDomain::Matrix => "a matrix",
        ParamDomain::List => "a list of numbers",
        ParamDomain::TableList => "a list of tables",
        ParamDomain::MatrixList => "a list of matrices",
    }
}
