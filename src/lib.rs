//! Strategy Forge
//!
//! Turns a free-form natural-language description of a trading
//! strategy into a structured, executable strategy record and manages
//! that record through its lifecycle (draft, active, stopped), with
//! marketplace publication and simulated performance tracking.
//!
//! Extraction is heuristic pattern matching, not NLP: every field
//! extractor has a documented default, so composition always yields a
//! complete strategy. The chain backend is a pluggable collaborator
//! and fully simulated by default.

pub mod chain;
pub mod composer;
pub mod config;
pub mod extract;
pub mod lifecycle;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use types::*;
