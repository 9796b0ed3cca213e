//! Model client adapters.

mod anthropic;
mod mock;

pub use anthropic::{AnthropicConfig, AnthropicModelClient};
pub use mock::MockModelClient;
