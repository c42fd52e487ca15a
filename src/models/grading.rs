use serde::{Deserialize, Serialize};

/// 单次评分的满分
pub const MAX_SCORE: f64 = 10.0;

/// 调用方提交的一条待评答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingRequest {
    pub question: String,
    pub student_answer: String,
    #[serde(default)]
    pub model_answer: Option<String>,
    pub module_id: String,
}

impl GradingRequest {
    pub fn new(
        module_id: impl Into<String>,
        question: impl Into<String>,
        student_answer: impl Into<String>,
        model_answer: Option<String>,
    ) -> Self {
        Self {
            question: question.into(),
            student_answer: student_answer.into(),
            model_answer,
            module_id: module_id.into(),
        }
    }
}

/// 反思循环的最终结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    /// 取值 `[0, 10]`
    pub score: f64,
    pub feedback: String,
    pub method: String,
    pub retry_count: u32,
}

impl GradingResult {
    /// 按题目分值 `question_mark` 折算得分
    pub fn weighted_score(&self, question_mark: f64) -> f64 {
        self.score / MAX_SCORE * question_mark
    }
}

/// 持久化层交来的一行提交记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub module: String,
    pub question: String,
    #[serde(default)]
    pub model_answer: Option<String>,
    pub student_answer: String,
    pub question_mark: f64,
}

/// 写回持久化层的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedSubmission {
    pub result: GradingResult,
    pub awarded_marks: f64,
}
