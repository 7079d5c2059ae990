//! Declarative query/rank/sort steps and their interpreter.

mod interpreter;
mod step;

pub use interpreter::Pipeline;
pub use step::{PipelineStep, QueryParams};
