//! Interactive just-intonation lattice engine.
//!
//! A performer explores a two-dimensional lattice of pitch ratios (the
//! 3x5 exponent plane plus higher-prime "ghost" overlays), toggles nodes
//! to sustain them through an external polyphonic tone engine, and
//! transposes or inspects them live. This crate owns the state that has
//! to stay mutually consistent under rapid overlapping input: selection
//! membership and order, animation phases, and the voice pool, with
//! debouncing and cancellation so nothing double-triggers.
//!
//! The view layer, tone synthesis, and export formats live elsewhere;
//! they talk to [`engine::LatticeEngine`] through its accessors and the
//! trait objects injected at construction.

pub mod config;
pub mod core;
pub mod engine;
