pub mod assembler;
pub mod patterns;

pub use assembler::StatsAssembler;
pub use patterns::{PatternDetector, PeakHours};
