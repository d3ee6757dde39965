mod sequencer;
mod step;
mod validate;

pub use sequencer::{reduce, sequence, PipelineState};
pub use step::PipelineStep;
pub use validate::{parse_steps, validate, EMPTY_PIPELINE};
