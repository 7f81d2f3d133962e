//! Purpose: Library crate behind the `setsim-results` CLI and its tests.
//! Exports: `core` (compact column decoders, cost model, errors), `results` (tables, stats),
//! `notice` (structured stderr notices).
//! Role: Decode set-similarity benchmark logs and summarize them per query-size interval.
//! Invariants: Decoders in `core` are pure; all file I/O lives in `results::load`.
//! Invariants: Modules prefer explicit inputs/outputs over hidden state.
pub mod core;
pub mod notice;
pub mod results;
