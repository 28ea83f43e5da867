//! Pipeline components: shared context, producer/consumer workers, orchestration.

pub mod consumer;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod producer;
pub mod worker;

pub use consumer::Consumer;
pub use context::{
    PipelineContext, PipelineEvent, PipelineState, RunControl, create_pipeline_context,
};
pub use error_handler::report_leftover_items;
pub use orchestrator::{Orchestrator, run_pipeline};
pub use producer::Producer;
pub use worker::{StopFlag, WorkerHandle};
