//! Pipeline module - bounded intake queue and concurrent dispatch.

mod dedup;
mod forwarding_pipeline;


pub use dedup::SeenTransactions;
pub use forwarding_pipeline::{
    ForwardingPipeline, IntakeClosed, IntakeHandle, PipelineConfig, PipelineHandle,
    PipelineState, PipelineStats,
};
