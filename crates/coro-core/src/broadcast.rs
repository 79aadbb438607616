//! Argument broadcasting: from argument shapes to one value per voice.
//!
//! Each argument is first normalized to an ordered sequence (a scalar becomes
//! a length-1 sequence, a stream becomes one tap per producer voice). The
//! voice count is the longest sequence; shorter sequences cycle, so voice `i`
//! reads `seq[i mod len]`. There is no padding with defaults.
//!
//! ```rust
//! use coro_core::{ExpandableValue, VoiceValue, broadcast};
//!
//! let args = [
//!     ExpandableValue::from([100.0, 200.0]),
//!     ExpandableValue::from([1.0, 2.0, 3.0, 4.0]),
//! ];
//! let b = broadcast(&args).unwrap();
//! assert_eq!(b.voice_count(), 4);
//! assert_eq!(b.value(0, 2), &VoiceValue::Number(100.0));
//! ```

use std::sync::Arc;

use crate::container::Container;
use crate::error::{CoroError, Result};
use crate::value::{ExpandableValue, VoiceValue};

/// Normalize an argument to its ordered per-voice sequence.
pub fn normalize(value: &ExpandableValue) -> Vec<VoiceValue> {
    match value {
        ExpandableValue::Scalar(s) => vec![VoiceValue::from(*s)],
        ExpandableValue::Sequence(seq) => seq.iter().copied().map(VoiceValue::from).collect(),
        ExpandableValue::Stream(source) => {
            source.taps().into_iter().map(VoiceValue::Stream).collect()
        }
        ExpandableValue::Containers(c) => c.iter().cloned().map(VoiceValue::Container).collect(),
    }
}

/// Resolve an argument as one unexpanded value shared by every voice.
///
/// Used for parameters that take a whole list (choice lists, morph sources).
/// Returns `None` for streams, which have no whole-list form.
pub fn whole(value: &ExpandableValue) -> Option<VoiceValue> {
    match value {
        ExpandableValue::Scalar(s) => Some(VoiceValue::List(Arc::from(vec![s.as_f32()]))),
        ExpandableValue::Sequence(seq) => Some(VoiceValue::List(
            seq.iter().map(|s| s.as_f32()).collect::<Vec<_>>().into(),
        )),
        ExpandableValue::Containers(c) => {
            Some(VoiceValue::Containers(Arc::<[Container]>::from(c.as_slice())))
        }
        ExpandableValue::Stream(_) => None,
    }
}

/// Cycling index: `seq[i mod len]`, or `None` for an empty sequence.
#[inline]
pub fn wrap<T>(seq: &[T], i: usize) -> Option<&T> {
    if seq.is_empty() {
        None
    } else {
        seq.get(i % seq.len())
    }
}

/// Expand an already normalized sequence to exactly `voice_count` values.
pub fn expand(seq: &[VoiceValue], voice_count: usize) -> Vec<VoiceValue> {
    (0..voice_count)
        .filter_map(|i| wrap(seq, i).cloned())
        .collect()
}

/// Result of broadcasting a set of arguments.
#[derive(Debug, Clone)]
pub struct Broadcast {
    names: Vec<String>,
    args: Vec<Vec<VoiceValue>>,
    voice_count: usize,
}

impl Broadcast {
    /// Broadcast already normalized arguments, each tagged with a name used
    /// in error messages.
    ///
    /// Fails with [`CoroError::EmptyArgument`] if there are no arguments or
    /// any argument is empty.
    pub fn from_normalized(args: Vec<(String, Vec<VoiceValue>)>) -> Result<Self> {
        if args.is_empty() {
            return Err(CoroError::EmptyArgument("<no arguments>".to_string()));
        }
        if let Some((name, _)) = args.iter().find(|(_, seq)| seq.is_empty()) {
            return Err(CoroError::EmptyArgument(name.clone()));
        }
        let voice_count = args.iter().map(|(_, seq)| seq.len()).max().unwrap_or(1);
        let (names, args) = args.into_iter().unzip();
        Ok(Self {
            names,
            args,
            voice_count,
        })
    }

    /// Common voice count: the longest normalized argument.
    pub fn voice_count(&self) -> usize {
        self.voice_count
    }

    /// Number of arguments.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Name of argument `arg`.
    pub fn name(&self, arg: usize) -> &str {
        &self.names[arg]
    }

    /// Normalized (unexpanded) sequence of argument `arg`.
    pub fn arg(&self, arg: usize) -> &[VoiceValue] {
        &self.args[arg]
    }

    /// Effective value of argument `arg` on voice `voice`.
    pub fn value(&self, arg: usize, voice: usize) -> &VoiceValue {
        let seq = &self.args[arg];
        &seq[voice % seq.len()]
    }

    /// The per-voice argument tuple for `voice`, in argument order.
    pub fn voice(&self, voice: usize) -> Vec<VoiceValue> {
        (0..self.args.len())
            .map(|j| self.value(j, voice).clone())
            .collect()
    }

    /// Every argument expanded to the full voice count, argument-major.
    pub fn per_voice_args(&self) -> Vec<Vec<VoiceValue>> {
        self.args
            .iter()
            .map(|seq| expand(seq, self.voice_count))
            .collect()
    }
}

/// Broadcast a set of arguments.
pub fn broadcast(args: &[ExpandableValue]) -> Result<Broadcast> {
    Broadcast::from_normalized(
        args.iter()
            .enumerate()
            .map(|(j, a)| (format!("argument {j}"), normalize(a)))
            .collect(),
    )
}

/// Broadcast one new value against an existing, fixed voice count.
///
/// Longer values are cut by the cycling rule; shorter values repeat.
pub fn rebroadcast(value: &ExpandableValue, voice_count: usize) -> Result<Vec<VoiceValue>> {
    let seq = normalize(value);
    if seq.is_empty() {
        return Err(CoroError::EmptyArgument("value".to_string()));
    }
    Ok(expand(&seq, voice_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Table;

    fn numbers(values: &[VoiceValue]) -> Vec<f32> {
        values.iter().filter_map(VoiceValue::as_number).collect()
    }

    #[test]
    fn scalar_reaches_every_voice() {
        let b = broadcast(&[
            ExpandableValue::from([100.0, 200.0, 300.0]),
            ExpandableValue::from(0.25),
        ])
        .unwrap();
        assert_eq!(b.voice_count(), 3);
        let per_voice = b.per_voice_args();
        assert_eq!(numbers(&per_voice[0]), vec![100.0, 200.0, 300.0]);
        assert_eq!(numbers(&per_voice[1]), vec![0.25, 0.25, 0.25]);
    }

    #[test]
    fn shorter_sequences_cycle() {
        let b = broadcast(&[
            ExpandableValue::from([100.0, 200.0]),
            ExpandableValue::from([1.0, 2.0, 3.0, 4.0]),
        ])
        .unwrap();
        assert_eq!(b.voice_count(), 4);
        assert_eq!(
            numbers(&b.per_voice_args()[0]),
            vec![100.0, 200.0, 100.0, 200.0]
        );
        assert_eq!(
            b.voice(3),
            vec![VoiceValue::Number(200.0), VoiceValue::Number(4.0)]
        );
    }

    #[test]
    fn all_empty_fails() {
        let err = broadcast(&[
            ExpandableValue::from(Vec::<f32>::new()),
            ExpandableValue::from(Vec::<f32>::new()),
        ])
        .unwrap_err();
        assert!(matches!(err, CoroError::EmptyArgument(_)));
    }

    #[test]
    fn one_empty_among_others_fails() {
        let err = broadcast(&[
            ExpandableValue::from([1.0, 2.0]),
            ExpandableValue::from(Vec::<f32>::new()),
        ])
        .unwrap_err();
        assert_eq!(err, CoroError::EmptyArgument("argument 1".to_string()));
    }

    #[test]
    fn no_arguments_fails() {
        assert!(broadcast(&[]).is_err());
    }

    #[test]
    fn rebroadcast_cycles_and_truncates() {
        let short = rebroadcast(&ExpandableValue::from([50.0]), 4).unwrap();
        assert_eq!(numbers(&short), vec![50.0; 4]);
        let long = rebroadcast(&ExpandableValue::from([1.0, 2.0, 3.0, 4.0, 5.0]), 2).unwrap();
        assert_eq!(numbers(&long), vec![1.0, 2.0]);
        assert!(rebroadcast(&ExpandableValue::from(Vec::<f32>::new()), 2).is_err());
    }

    #[test]
    fn containers_broadcast_like_sequences() {
        let tables = Table::multi(2, 16, 100.0).unwrap();
        let b = broadcast(&[
            ExpandableValue::from(tables.clone()),
            ExpandableValue::from([1.0, 2.0, 3.0]),
        ])
        .unwrap();
        assert_eq!(b.voice_count(), 3);
        assert_eq!(b.value(0, 2).as_table(), Some(&tables[0]));
    }

    #[test]
    fn whole_keeps_list_intact() {
        let v = whole(&ExpandableValue::from([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(v.as_list(), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn wrap_handles_empty() {
        let empty: [i32; 0] = [];
        assert_eq!(wrap(&empty, 3), None);
        assert_eq!(wrap(&[1, 2, 3], 7), Some(&2));
    }
}
