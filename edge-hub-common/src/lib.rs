//! Ambient facilities shared by the edge hub crates.
//!
//! Currently this is the process-wide logger; the hub core itself only emits
//! `tracing` events and never installs a subscriber.
mod logger;

pub use edge_hub_error::{HubError, HubResult};
pub use logger::{parse_level, Logger};
