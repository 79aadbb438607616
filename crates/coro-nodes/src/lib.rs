//! Coro Nodes - Node kinds built on coro-core
//!
//! Every kind declares a positional parameter table and a per-voice channel
//! unit; the typed handles below add a getter and setter per parameter.
//!
//! ## Sources and Triggers
//!
//! - [`Sig`] - Constant or stream follower
//! - [`Metro`] - Periodic trigger
//! - [`TrigRand`], [`TrigChoice`] - New random value on each trigger
//! - [`TrigEnv`] - Envelope table read once per trigger
//! - [`Counter`], [`Select`] - Trigger counting and matching
//!
//! ## Tables
//!
//! - [`Osc`], [`OscLoop`], [`TableRead`], [`Pointer`] - Table readers
//! - [`TableIndex`], [`Lookup`] - Direct and transfer-function lookups
//! - [`TableRec`], [`TrigTableRec`], [`TablePut`] - Recorders
//! - [`TableMorph`], [`TableScale`] - Table transforms
//!
//! ## Matrices
//!
//! - [`MatrixRec`], [`MatrixRecLoop`], [`MatrixPointer`], [`MatrixMorph`]
//!
//! ## Random
//!
//! - [`Randi`], [`Randh`], [`RandInt`], [`Choice`], [`Urn`]
//!
//! ## Example
//!
//! ```rust
//! use coro_core::{Engine, EngineConfig, Table};
//! use coro_nodes::{Metro, TrigEnv};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let metro: Metro = Metro::builder().arg("time", [0.25, 0.5]).build_into(&engine).unwrap();
//! let env: TrigEnv = TrigEnv::builder()
//!     .arg("input", metro.output())
//!     .arg("table", Table::hann(512, 48000.0).unwrap())
//!     .arg("dur", 0.2)
//!     .build_into(&engine)
//!     .unwrap();
//! metro.play();
//! assert_eq!(env.voice_count(), 2);
//! engine.process_block();
//! ```

#[macro_use]
mod macros;

mod control;
pub mod interp;
pub mod matrix;
pub mod random;
pub mod rng;
pub mod source;
pub mod table;
pub mod table_write;
pub mod trigger;

// Re-export main types at crate root
pub use interp::Interp;
pub use matrix::{
    MATRIX_MORPH_PARAMS, MATRIX_POINTER_PARAMS, MATRIX_REC_LOOP_PARAMS, MATRIX_REC_PARAMS,
    MatrixMorph, MatrixMorphKind, MatrixPointer, MatrixPointerKind, MatrixRec, MatrixRecKind,
    MatrixRecLoop, MatrixRecLoopKind,
};
pub use random::{
    CHOICE_PARAMS, Choice, ChoiceKind, RAND_INT_PARAMS, RANDH_PARAMS, RANDI_PARAMS, RandInt,
    RandIntKind, Randh, RandhKind, Randi, RandiKind, URN_PARAMS, Urn, UrnKind,
};
pub use rng::Lcg;
pub use source::{SIG_PARAMS, Sig, SigKind};
pub use table::{
    LOOKUP_PARAMS, Lookup, LookupKind, OSC_LOOP_PARAMS, OSC_PARAMS, Osc, OscKind, OscLoop,
    OscLoopKind, POINTER_PARAMS, Pointer, PointerKind, TABLE_INDEX_PARAMS, TABLE_READ_PARAMS,
    TableIndex, TableIndexKind, TableRead, TableReadKind,
};
pub use table_write::{
    TABLE_MORPH_PARAMS, TABLE_PUT_PARAMS, TABLE_REC_PARAMS, TABLE_SCALE_PARAMS,
    TRIG_TABLE_REC_PARAMS, TableMorph, TableMorphKind, TablePut, TablePutKind, TableRec,
    TableRecKind, TableScale, TableScaleKind, TrigTableRec, TrigTableRecKind,
};
pub use trigger::{
    COUNTER_PARAMS, Counter, CounterKind, METRO_PARAMS, Metro, MetroKind, SELECT_PARAMS, Select,
    SelectKind, TRIG_CHOICE_PARAMS, TRIG_ENV_PARAMS, TRIG_RAND_PARAMS, TrigChoice, TrigChoiceKind,
    TrigEnv, TrigEnvKind, TrigRand, TrigRandKind,
};
