//! 评分器 - 编排层
//!
//! ## 职责
//!
//! 库的应用入口：
//!
//! 1. **初始化**：配置、注册表、启动横幅
//! 2. **评分**：路由 → `GradingFlow::run`，外面包一层配置的超时
//! 3. **作答**：按题目分值折算 0..10 的分数
//! 4. **预热**：启动时一次性构建所有模块索引
//!
//! 评分器不保存任何请求级状态，可以放在 `Arc` 后面共享

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, GradingError};
use crate::models::{GradedSubmission, GradingRequest, GradingResult, Submission};
use crate::orchestrator::registry::{ModuleRegistry, WarmUpReport};
use crate::utils::logging::{log_startup, truncate_text};

pub struct Grader {
    config: Config,
    registry: ModuleRegistry,
}

impl Grader {
    /// 按 `config` 为每个已知模块配置一个流程
    pub fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);
        let registry = ModuleRegistry::from_config(&config)?;
        Ok(Self { config, registry })
    }

    /// 使用指定的注册表（桩模型、预构建索引）
    pub fn with_registry(config: Config, registry: ModuleRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 为一个答案评分
    ///
    /// # 参数
    /// - `module_id`：已知模块标识之一（精确匹配）
    /// - `question`：不能为空
    /// - `student_answer`：为空时记 0 分，不调用模型
    /// - `model_answer`：调用方持有的标准答案（可选）
    ///
    /// # 错误
    /// - `UnsupportedModule`：未知的 `module_id`
    /// - `InvalidInput`：题目为空
    /// - 模块语料或向量化不可用时的初始化错误
    /// - `ModelInvocation`：模型调用失败或评分超时
    pub async fn grade(
        &self,
        module_id: &str,
        question: &str,
        student_answer: &str,
        model_answer: Option<&str>,
    ) -> AppResult<GradingResult> {
        let request = GradingRequest::new(
            module_id,
            question,
            student_answer,
            model_answer.map(str::to_string),
        );
        self.grade_request(&request).await
    }

    pub async fn grade_request(&self, request: &GradingRequest) -> AppResult<GradingResult> {
        let flow = self.registry.route(&request.module_id)?;
        info!(
            "📝 [{}] 开始评分: {}",
            flow.module(),
            truncate_text(&request.question, 60)
        );

        match self.config.grading_timeout_secs {
            None => flow.run(request).await,
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), flow.run(request))
                .await
                .unwrap_or_else(|_| {
                    warn!("⏱️ [{}] 评分超时 ({}s)", flow.module(), secs);
                    Err(GradingError::model_invocation(
                        flow.module().model_name(),
                        format!("评分超时 ({}s)", secs),
                    ))
                }),
        }
    }

    /// 为一份已保存的作答评分，并按题目分值折算
    pub async fn grade_submission(&self, submission: &Submission) -> AppResult<GradedSubmission> {
        let result = self
            .grade(
                &submission.module,
                &submission.question,
                &submission.student_answer,
                submission.model_answer.as_deref(),
            )
            .await?;

        let awarded_marks = result.weighted_score(submission.question_mark);
        Ok(GradedSubmission {
            result,
            awarded_marks,
        })
    }

    /// 立即构建所有模块索引，而不是等到首个请求
    pub async fn warm_up(&self) -> WarmUpReport {
        info!("🔥 预热模块索引...");
        let report = self.registry.warm_up().await;
        info!(
            "预热完成: {} 个就绪, {} 个失败",
            report.ready.len(),
            report.failed.len()
        );
        report
    }

    pub fn supported_modules(&self) -> Vec<&'static str> {
        self.registry.supported_modules()
    }
}
