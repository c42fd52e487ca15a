pub mod grading_flow;
pub mod grading_state;

#[cfg(test)]
pub(crate) mod test_support;

pub use grading_flow::{
    reflect, FlowState, GradingFlow, Reflection, NO_ANSWER_FEEDBACK, RETRIEVAL_TOP_K,
    RETRY_BELOW_SCORE, RETRY_LIMIT,
};
pub use grading_state::GradingState;
