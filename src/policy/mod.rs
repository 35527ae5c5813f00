pub mod engine;
pub mod inspector;
pub mod sweep;

pub use engine::{ArchivePolicy, SkipReason, Verdict};
pub use inspector::Exemption;
pub use sweep::{SweepReport, sweep_groups};
