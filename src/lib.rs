//! chronomap: spatiotemporal visualization engine for a historical events
//! map and timeline explorer.
//!
//! The crate decides, for a map viewport, a time window and an interaction
//! mode, which events are visible, how dense the timeline waveform is, where
//! detail cards go, and how focus drill-down and playback walk the dataset.
//! Fetching, map drawing and UI chrome stay with the host: the engine emits
//! fetch effects and render frames and consumes rows and projections.

pub mod api;
pub mod core;
pub mod data;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod telemetry;

pub use api::{EngineAction, EngineConfig, EngineEffect, ExplorerEngine};
pub use error::{EngineError, EngineResult};
