// Adapters layer: concrete drivers behind the ConnectionPool / Driver ports.

pub mod bridge;
pub mod dry_run;

pub use bridge::{BridgeDriver, BridgePool};
pub use dry_run::{DryRunDriver, DryRunPool};
