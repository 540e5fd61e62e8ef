pub mod batch;
pub mod pipeline;

pub use batch::{BatchConfig, BatchOrchestrator};
pub use pipeline::ProjectPipeline;
