//! 评分流程 - 流程层
//!
//! 核心职责：单次作答的反思状态机
//!
//! ```text
//!            ┌──────────── refine (retry_count += 1) ◄───┐
//!            ▼                                           │ score < 4 and retries left
//!  ──► Grading ── retrieve → prompt → invoke → parse ────┤
//!            │                                           │ otherwise
//!            │ blank answer                              ▼
//!            └─────────────────────────────────────────► Done ──► GradingResult
//! ```
//!
//! 重评只是原样再跑一次评分步骤，分数变化只能来自模型的采样温度。
//! 评分步骤中的任何失败都会中止整个循环，而不是记为 0 分。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::clients::ModelClient;
use crate::error::{AppResult, GradingError};
use crate::infrastructure::Embedder;
use crate::models::{GradingModule, GradingRequest, GradingResult};
use crate::services::{build_prompt, parse_response, ModuleIndex};
use crate::workflow::grading_state::GradingState;

/// 每次作答允许的重评次数
pub const RETRY_LIMIT: u32 = 3;

/// 低于此分数且仍有重评次数时重新评分
pub const RETRY_BELOW_SCORE: f64 = 4.0;

/// 每次评分检索的参考文档数
pub const RETRIEVAL_TOP_K: usize = 3;

pub const NO_ANSWER_FEEDBACK: &str =
    "No answer provided. Please attempt the question to receive feedback.";

/// 反思循环的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Grading,
    Refining,
    Done,
}

/// 评分步骤之后的决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflection {
    Retry,
    Accept,
}

/// 尚未评分，或分数过低且仍有重评次数时重试
pub fn reflect(state: &GradingState, limit: u32) -> Reflection {
    match state.score {
        None => Reflection::Retry,
        Some(score) if score < RETRY_BELOW_SCORE && state.retry_count < limit => Reflection::Retry,
        Some(_) => Reflection::Accept,
    }
}

/// 单次评分步骤的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GradeOutcome {
    /// 空答案直接短路，不检索也不调用模型
    NoAnswer,
    Graded,
}

/// 单个模块的评分流水线
///
/// - 持有模块共享的索引、向量化实现和模型客户端
/// - 不保存任何单次作答的状态，每次 `run` 各自创建 `GradingState`
/// - 用信号量限制该模块的并发模型调用
pub struct GradingFlow {
    module: GradingModule,
    index: ModuleIndex,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ModelClient>,
    model_permits: Semaphore,
}

impl GradingFlow {
    pub fn new(
        module: GradingModule,
        index: ModuleIndex,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ModelClient>,
        max_concurrent_model_calls: usize,
    ) -> Self {
        Self {
            module,
            index,
            embedder,
            model,
            model_permits: Semaphore::new(max_concurrent_model_calls.max(1)),
        }
    }

    pub fn module(&self) -> GradingModule {
        self.module
    }

    /// 在首个请求之前构建（或加载）模块索引
    pub async fn prepare(&self) -> AppResult<()> {
        self.index.get_or_build(self.embedder.as_ref()).await.map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// 对一次作答执行反思循环
    ///
    /// # 错误
    /// - `InvalidInput`：题目为空
    /// - 索引的初始化错误（`CorpusLoad`、`EmbeddingUnavailable` 等）
    /// - `ModelInvocation`：模型调用失败
    pub async fn run(&self, request: &GradingRequest) -> AppResult<GradingResult> {
        if request.question.trim().is_empty() {
            return Err(GradingError::invalid_input("question", "不能为空"));
        }

        let mut state = GradingState::new(self.module, request);
        let mut step = FlowState::Grading;

        loop {
            step = match step {
                FlowState::Grading => {
                    let outcome = self.grade(&mut state).await.inspect_err(|e| {
                        error!("{} ❌ 评分中止: {}", state, e);
                    })?;

                    match outcome {
                        GradeOutcome::NoAnswer => FlowState::Done,
                        GradeOutcome::Graded => match reflect(&state, RETRY_LIMIT) {
                            Reflection::Retry => FlowState::Refining,
                            Reflection::Accept => FlowState::Done,
                        },
                    }
                }
                FlowState::Refining => {
                    state.refine();
                    info!(
                        "{} 🔁 分数过低，重新评分 ({}/{})",
                        state, state.retry_count, RETRY_LIMIT
                    );
                    FlowState::Grading
                }
                FlowState::Done => break,
            };
        }

        let result = state.into_result();
        info!(
            "[{}] ✓ 评分完成: {} 分，重评 {} 次",
            self.module, result.score, result.retry_count
        );
        Ok(result)
    }

    /// 评分步骤：检索、拼装提示词、调用模型、解析
    async fn grade(&self, state: &mut GradingState) -> AppResult<GradeOutcome> {
        if state.student_answer.trim().is_empty() {
            info!("{} 答案为空，跳过检索和模型调用", state);
            state.record(0.0, NO_ANSWER_FEEDBACK.to_string());
            return Ok(GradeOutcome::NoAnswer);
        }

        let index = self.index.get_or_build(self.embedder.as_ref()).await?;
        let query = self.embedder.embed_query(&state.student_answer).await?;
        let retrieved = index.search(&query, RETRIEVAL_TOP_K)?;
        debug!("{} 检索到 {} 条参考文档", state, retrieved.len());

        let prompt = build_prompt(
            &state.question,
            &state.student_answer,
            state.model_answer.as_deref(),
            &retrieved,
            self.module.template(),
        );

        let response = self.invoke_model(&prompt).await?;
        let (score, feedback) = parse_response(&response);
        debug!("{} 模型给分 {}", state, score);

        state.record(score, feedback);
        Ok(GradeOutcome::Graded)
    }

    async fn invoke_model(&self, prompt: &str) -> AppResult<String> {
        let _permit = self
            .model_permits
            .acquire()
            .await
            .map_err(|e| GradingError::model_invocation(self.model.model_name(), e))?;
        self.model.invoke(prompt).await
    }
}

impl std::fmt::Debug for GradingFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradingFlow")
            .field("module", &self.module)
            .field("model", &self.model.model_name())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::test_support::{database_flow, CountingEmbedder, ScriptedModel};
    use tokio_test::{assert_err, assert_ok};

    fn request(answer: &str) -> GradingRequest {
        GradingRequest::new(
            "Database Module",
            "What is a foreign key?",
            answer,
            Some("A field referencing the primary key of another table.".to_string()),
        )
    }

    fn state_with(score: Option<f64>, retry_count: u32) -> GradingState {
        let mut state = GradingState::new(GradingModule::Database, &request("x"));
        state.score = score;
        state.retry_count = retry_count;
        state
    }

    #[test]
    fn reflect_decisions() {
        assert_eq!(reflect(&state_with(None, 0), RETRY_LIMIT), Reflection::Retry);
        assert_eq!(reflect(&state_with(Some(3.9), 0), RETRY_LIMIT), Reflection::Retry);
        assert_eq!(reflect(&state_with(Some(1.0), 2), RETRY_LIMIT), Reflection::Retry);
        assert_eq!(reflect(&state_with(Some(1.0), 3), RETRY_LIMIT), Reflection::Accept);
        assert_eq!(reflect(&state_with(Some(4.0), 0), RETRY_LIMIT), Reflection::Accept);
    }

    #[tokio::test]
    async fn blank_answer_short_circuits() {
        for answer in ["", "   ", "\n\t"] {
            let model = ScriptedModel::always("Score: 9\nFeedback: unused");
            let embedder = CountingEmbedder::new(64);
            let flow = database_flow(model.clone(), embedder.clone());

            let result = assert_ok!(flow.run(&request(answer)).await);

            assert_eq!(result.score, 0.0);
            assert_eq!(result.feedback, NO_ANSWER_FEEDBACK);
            assert_eq!(result.retry_count, 0);
            assert_eq!(result.method, "mistral-rag");
            assert_eq!(model.calls(), 0);
            assert_eq!(embedder.calls(), 0);
        }
    }

    #[tokio::test]
    async fn good_first_score_is_accepted() {
        let model = ScriptedModel::always("Score: 7\nFeedback: Good job");
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));

        let result = assert_ok!(flow.run(&request("it links two tables")).await);

        assert_eq!(result.score, 7.0);
        assert_eq!(result.feedback, "Good job");
        assert_eq!(result.retry_count, 0);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn persistent_low_score_stops_at_retry_limit() {
        let model = ScriptedModel::always("Score: 1\nFeedback: Incorrect");
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));

        let result = assert_ok!(flow.run(&request("a table")).await);

        assert_eq!(result.score, 1.0);
        assert_eq!(result.retry_count, RETRY_LIMIT);
        assert_eq!(model.calls(), RETRY_LIMIT as usize + 1);
    }

    #[tokio::test]
    async fn retry_accepts_first_passing_score() {
        let model = ScriptedModel::sequence(&[
            "Score: 2\nFeedback: Vague",
            "Score: 6\nFeedback: Links tables via a key",
            "Score: 9\nFeedback: never reached",
        ]);
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));

        let result = assert_ok!(flow.run(&request("it links two tables")).await);

        assert_eq!(result.score, 6.0);
        assert_eq!(result.feedback, "Links tables via a key");
        assert_eq!(result.retry_count, 1);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn unparseable_response_is_retried_as_low_score() {
        let model = ScriptedModel::sequence(&["I am not sure.", "Score: 5\nFeedback: Fine"]);
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));

        let result = assert_ok!(flow.run(&request("it links two tables")).await);

        assert_eq!(result.score, 5.0);
        assert_eq!(result.retry_count, 1);
    }

    #[tokio::test]
    async fn model_failure_aborts_instead_of_scoring_zero() {
        let model = ScriptedModel::failing();
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));

        let err = assert_err!(flow.run(&request("it links two tables")).await);

        assert!(matches!(err, GradingError::ModelInvocation { .. }));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn failed_retry_discards_the_low_first_score() {
        let model = ScriptedModel::then_fail(&["Score: 1\nFeedback: Weak"]);
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));

        let err = assert_err!(flow.run(&request("it links two tables")).await);

        assert!(matches!(err, GradingError::ModelInvocation { .. }));
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn debug_output_names_the_module() {
        let flow = database_flow(ScriptedModel::always("Score: 5"), CountingEmbedder::new(16));

        let rendered = format!("{:?}", flow);

        assert!(rendered.starts_with("GradingFlow"));
        assert!(rendered.contains("Database"));
        assert!(rendered.contains("scripted"));
    }

    #[tokio::test]
    async fn blank_question_is_invalid_input() {
        let model = ScriptedModel::always("Score: 9\nFeedback: unused");
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));
        let mut req = request("answer");
        req.question = "  ".to_string();

        let err = assert_err!(flow.run(&req).await);

        assert!(matches!(err, GradingError::InvalidInput { field: "question", .. }));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn prompt_contains_retrieved_context_and_answers() {
        let model = ScriptedModel::always("Score: 8\nFeedback: ok");
        let flow = database_flow(model.clone(), CountingEmbedder::new(64));

        assert_ok!(flow.run(&request("it links two tables")).await);

        let prompt = model.last_prompt().unwrap();
        assert_eq!(prompt.matches("\n---\n").count(), RETRIEVAL_TOP_K - 1);
        assert!(prompt.contains("Question: What is a foreign key?"));
        assert!(prompt.contains("\"\"\"it links two tables\"\"\""));
        assert!(prompt.contains("Model Answer (if available): A field referencing"));
    }
}
