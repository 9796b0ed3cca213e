//! Flight search adapters.

mod mock;

pub use mock::MockFlightSearch;
