//! 评分状态
//!
//! 一次评分的工作记录，只属于某一次反思循环，从不共享

use std::fmt::Display;

use crate::models::{GradingModule, GradingRequest, GradingResult, MAX_SCORE};

/// 贯穿反思循环的可变记录
///
/// 只有评分步骤写 `score`/`feedback`，只有重评步骤改 `retry_count`
#[derive(Debug, Clone, PartialEq)]
pub struct GradingState {
    pub module: GradingModule,
    pub question: String,
    pub student_answer: String,
    pub model_answer: Option<String>,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub retry_count: u32,
}

impl GradingState {
    pub fn new(module: GradingModule, request: &GradingRequest) -> Self {
        Self {
            module,
            question: request.question.clone(),
            student_answer: request.student_answer.clone(),
            model_answer: request.model_answer.clone(),
            score: None,
            feedback: None,
            retry_count: 0,
        }
    }

    /// 评分步骤的输出
    pub fn record(&mut self, score: f64, feedback: String) {
        self.score = Some(score);
        self.feedback = Some(feedback);
    }

    /// 重评
    pub fn refine(&mut self) {
        self.retry_count += 1;
    }

    /// 转换为最终结果，分数限制在 `[0, 10]`
    pub fn into_result(self) -> GradingResult {
        GradingResult {
            score: self.score.unwrap_or(0.0).clamp(0.0, MAX_SCORE),
            feedback: self.feedback.unwrap_or_default(),
            method: self.module.method().to_string(),
            retry_count: self.retry_count,
        }
    }
}

impl Display for GradingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} | retry {}]", self.module, self.retry_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GradingRequest {
        GradingRequest::new("Database Module", "What is a view?", "a saved query", None)
    }

    #[test]
    fn starts_ungraded() {
        let state = GradingState::new(GradingModule::Database, &request());
        assert_eq!(state.retry_count, 0);
        assert!(state.score.is_none());
        assert!(state.feedback.is_none());
        assert_eq!(state.to_string(), "[Database Module | retry 0]");
    }

    #[test]
    fn result_carries_method_and_clamps_score() {
        let mut state = GradingState::new(GradingModule::Database, &request());
        state.record(12.0, "Excellent".to_string());
        state.refine();

        let result = state.into_result();
        assert_eq!(result.score, 10.0);
        assert_eq!(result.feedback, "Excellent");
        assert_eq!(result.method, "mistral-rag");
        assert_eq!(result.retry_count, 1);
    }
}
