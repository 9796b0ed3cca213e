//! Adapters: infrastructure implementations of the ports.

pub mod flight;
pub mod model;
pub mod store;

pub use flight::MockFlightSearch;
pub use model::{AnthropicConfig, AnthropicModelClient, MockModelClient};
pub use store::InMemorySessionStore;
