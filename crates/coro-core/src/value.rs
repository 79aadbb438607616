//! Expandable values: the argument shapes a node accepts.
//!
//! A node argument is a single scalar, an ordered sequence of scalars, a
//! reference to another node's output, or a sequence of containers. The
//! [`broadcast`](crate::broadcast) module resolves each of these into one
//! [`VoiceValue`] per voice.

use std::sync::Arc;

use crate::container::{Container, Matrix, Table};
use crate::signal::{StreamSource, StreamTap};

/// A single number or flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Numeric value.
    Number(f32),
    /// Boolean switch.
    Flag(bool),
}

impl Scalar {
    /// Numeric view; flags read as `0.0` or `1.0`.
    pub fn as_f32(self) -> f32 {
        match self {
            Scalar::Number(v) => v,
            Scalar::Flag(b) => f32::from(u8::from(b)),
        }
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Number(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Number(v as f32)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Flag(b)
    }
}

/// A constructor argument or attribute value before broadcasting.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandableValue {
    /// One value shared by every voice.
    Scalar(Scalar),
    /// One value per voice, cycled when shorter than the voice count.
    Sequence(Vec<Scalar>),
    /// Another producer's output; one entry per producer voice.
    Stream(StreamSource),
    /// Tables or matrices; a multi-channel table is a sequence of tables.
    Containers(Vec<Container>),
}

impl ExpandableValue {
    /// Length after normalization.
    ///
    /// For a stream this is the producer's voice count at the time of the
    /// call.
    pub fn len(&self) -> usize {
        match self {
            ExpandableValue::Scalar(_) => 1,
            ExpandableValue::Sequence(seq) => seq.len(),
            ExpandableValue::Stream(source) => source.voice_count(),
            ExpandableValue::Containers(c) => c.len(),
        }
    }

    /// Returns `true` if normalization yields no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single number, if this is a numeric scalar.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            ExpandableValue::Scalar(s) => Some(s.as_f32()),
            _ => None,
        }
    }

    /// The numbers of a scalar or sequence.
    pub fn as_numbers(&self) -> Option<Vec<f32>> {
        match self {
            ExpandableValue::Scalar(s) => Some(vec![s.as_f32()]),
            ExpandableValue::Sequence(seq) => Some(seq.iter().map(|s| s.as_f32()).collect()),
            _ => None,
        }
    }

    /// The stream source, if this is one.
    pub fn as_stream(&self) -> Option<&StreamSource> {
        match self {
            ExpandableValue::Stream(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for ExpandableValue {
    fn from(s: Scalar) -> Self {
        ExpandableValue::Scalar(s)
    }
}

impl From<f32> for ExpandableValue {
    fn from(v: f32) -> Self {
        ExpandableValue::Scalar(Scalar::Number(v))
    }
}

impl From<i32> for ExpandableValue {
    fn from(v: i32) -> Self {
        ExpandableValue::Scalar(Scalar::from(v))
    }
}

impl From<bool> for ExpandableValue {
    fn from(b: bool) -> Self {
        ExpandableValue::Scalar(Scalar::Flag(b))
    }
}

impl From<Vec<f32>> for ExpandableValue {
    fn from(v: Vec<f32>) -> Self {
        ExpandableValue::Sequence(v.into_iter().map(Scalar::Number).collect())
    }
}

impl From<&[f32]> for ExpandableValue {
    fn from(v: &[f32]) -> Self {
        ExpandableValue::Sequence(v.iter().copied().map(Scalar::Number).collect())
    }
}

impl<const N: usize> From<[f32; N]> for ExpandableValue {
    fn from(v: [f32; N]) -> Self {
        ExpandableValue::Sequence(v.into_iter().map(Scalar::Number).collect())
    }
}

impl From<Vec<Scalar>> for ExpandableValue {
    fn from(v: Vec<Scalar>) -> Self {
        ExpandableValue::Sequence(v)
    }
}

impl From<Vec<bool>> for ExpandableValue {
    fn from(v: Vec<bool>) -> Self {
        ExpandableValue::Sequence(v.into_iter().map(Scalar::Flag).collect())
    }
}

impl From<StreamSource> for ExpandableValue {
    fn from(s: StreamSource) -> Self {
        ExpandableValue::Stream(s)
    }
}

impl From<&StreamSource> for ExpandableValue {
    fn from(s: &StreamSource) -> Self {
        ExpandableValue::Stream(s.clone())
    }
}

impl From<Table> for ExpandableValue {
    fn from(t: Table) -> Self {
        ExpandableValue::Containers(vec![Container::Table(t)])
    }
}

impl From<&Table> for ExpandableValue {
    fn from(t: &Table) -> Self {
        ExpandableValue::Containers(vec![Container::Table(t.clone())])
    }
}

impl From<Matrix> for ExpandableValue {
    fn from(m: Matrix) -> Self {
        ExpandableValue::Containers(vec![Container::Matrix(m)])
    }
}

impl From<&Matrix> for ExpandableValue {
    fn from(m: &Matrix) -> Self {
        ExpandableValue::Containers(vec![Container::Matrix(m.clone())])
    }
}

impl From<Container> for ExpandableValue {
    fn from(c: Container) -> Self {
        ExpandableValue::Containers(vec![c])
    }
}

impl From<Vec<Table>> for ExpandableValue {
    fn from(v: Vec<Table>) -> Self {
        ExpandableValue::Containers(v.into_iter().map(Container::Table).collect())
    }
}

impl From<Vec<Matrix>> for ExpandableValue {
    fn from(v: Vec<Matrix>) -> Self {
        ExpandableValue::Containers(v.into_iter().map(Container::Matrix).collect())
    }
}

impl From<Vec<Container>> for ExpandableValue {
    fn from(v: Vec<Container>) -> Self {
        ExpandableValue::Containers(v)
    }
}

/// One voice's resolved value for one parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceValue {
    /// Numeric value.
    Number(f32),
    /// Boolean switch.
    Flag(bool),
    /// One voice of another producer.
    Stream(StreamTap),
    /// A table or matrix.
    Container(Container),
    /// A whole numeric list, handed unexpanded to every voice.
    List(Arc<[f32]>),
    /// A whole container list, handed unexpanded to every voice.
    Containers(Arc<[Container]>),
}

impl VoiceValue {
    /// Numeric view of numbers and flags.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            VoiceValue::Number(v) => Some(*v),
            VoiceValue::Flag(b) => Some(f32::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Boolean view of flags and numbers (non-zero is `true`).
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            VoiceValue::Flag(b) => Some(*b),
            VoiceValue::Number(v) => Some(*v != 0.0),
            _ => None,
        }
    }

    /// The stream tap, if this is one.
    pub fn as_tap(&self) -> Option<&StreamTap> {
        match self {
            VoiceValue::Stream(tap) => Some(tap),
            _ => None,
        }
    }

    /// The table, if this is one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            VoiceValue::Container(c) => c.as_table(),
            _ => None,
        }
    }

    /// The matrix, if this is one.
    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            VoiceValue::Container(c) => c.as_matrix(),
            _ => None,
        }
    }

    /// The whole numeric list, if this is one.
    pub fn as_list(&self) -> Option<&[f32]> {
        match self {
            VoiceValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// The whole container list, if this is one.
    pub fn as_containers(&self) -> Option<&[Container]> {
        match self {
            VoiceValue::Containers(c) => Some(c),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            VoiceValue::Number(_) => "number",
            VoiceValue::Flag(_) => "flag",
            VoiceValue::Stream(_) => "stream",
            VoiceValue::Container(Container::Table(_)) => "table",
            VoiceValue::Container(Container::Matrix(_)) => "matrix",
            VoiceValue::List(_) => "list",
            VoiceValue::Containers(_) => "container list",
        }
    }
}

impl From<Scalar> for VoiceValue {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Number(v) => VoiceValue::Number(v),
            Scalar::Flag(b) => VoiceValue::Flag(b),
        }
    }
}

impl From<f32> for VoiceValue {
    fn from(v: f32) -> Self {
        VoiceValue::Number(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        assert_eq!(ExpandableValue::from(0.25).len(), 1);
        assert_eq!(ExpandableValue::from(vec![1.0, 2.0, 3.0]).len(), 3);
        assert!(ExpandableValue::from(Vec::<f32>::new()).is_empty());
        let tables = Table::multi(2, 8, 100.0).unwrap();
        assert_eq!(ExpandableValue::from(tables).len(), 2);
    }

    #[test]
    fn numeric_views() {
        assert_eq!(ExpandableValue::from(true).as_number(), Some(1.0));
        assert_eq!(
            ExpandableValue::from([1.0, 2.0]).as_numbers(),
            Some(vec![1.0, 2.0])
        );
        assert_eq!(VoiceValue::Number(0.0).as_flag(), Some(false));
        assert_eq!(VoiceValue::Flag(true).as_number(), Some(1.0));
    }

    #[test]
    fn kind_names() {
        let t = Table::new(4, 100.0).unwrap();
        assert_eq!(VoiceValue::Container(t.into()).kind_name(), "table");
        assert_eq!(VoiceValue::List(Arc::from(vec![1.0])).kind_name(), "list");
    }
}
