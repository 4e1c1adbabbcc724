pub mod backend;
pub mod cli;
pub mod compositing;
pub mod core;
pub mod file_scanner;
pub mod orchestrator;
pub mod processing;
pub mod registry;

pub use crate::backend::{BackendCapability, ImageBackend};
pub use crate::compositing::{CompositingEngine, MergeJob};
pub use crate::core::{
    BackendId, ConversionOutcome, ConversionTask, ConvertError, ConvertResult, Direction,
    ImageFormatToken,
};
pub use crate::orchestrator::ConversionOrchestrator;
pub use crate::processing::{BatchScheduler, DefaultBatchConfig};
pub use crate::registry::{CapabilityRegistry, ProbeOptions};
