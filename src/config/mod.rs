pub mod schema;

pub use schema::{ArchiveConfig, BridgeConfig, Config, ReliabilityConfig, ScheduleConfig};
