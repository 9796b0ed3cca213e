//! Application layer: orchestration with side effects.

mod discovery_service;

pub use discovery_service::{DiscoveryError, DiscoveryService, TurnOutcome};
