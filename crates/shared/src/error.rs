use thiserror::Error;

use crate::steps::LAST_STEP;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunnelError {
    #[error("step {step} is outside the funnel range 1..={last}")]
    StepOutOfRange { step: u32, last: u32 },
}

impl FunnelError {
    pub fn step_out_of_range(step: u32) -> Self {
        Self::StepOutOfRange {
            step,
            last: LAST_STEP,
        }
    }
}
