mod actions;
mod dispatch;
mod engine;
mod engine_config;
mod engine_snapshot;
mod fetch_coordinator;
mod frame_builder;
mod json_contract;
mod snapshot_controller;

pub use actions::{EngineAction, EngineEffect, FetchQuery, FetchRequest};
pub use engine::ExplorerEngine;
pub use engine_config::EngineConfig;
pub use engine_snapshot::EngineSnapshot;
pub use json_contract::{ENGINE_SNAPSHOT_JSON_SCHEMA_V1, EngineSnapshotJsonContractV1};
