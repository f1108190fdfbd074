pub mod metrics;
pub mod tracing;

pub use metrics::{init_metrics, Metrics};
pub use tracing::{init_tracing, init_tracing_from_config};
