pub mod config;
pub mod events;
pub mod ids;
pub mod priority;
pub mod record;
pub mod stats;

pub use config::QueueConfig;
pub use events::QueueEvent;
pub use ids::JobId;
pub use priority::JobPriority;
pub use record::{JobStatus, QueuedJob};
pub use stats::QueueStats;
