//! # RAG Grader
//!
//! 基于检索增强、使用本地大模型为学生自由作答评分的库
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构，每层只依赖下层：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `Embedder` - 文本 → 向量（离线哈希或 Ollama）
//! - `IndexStore` - 持久化的索引文件
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - `ModelClient`：输入一段提示词，输出原始文本
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能为一次作答做什么"
//! - `ModuleIndex` / `RetrievalIndex` - 最近的参考文档
//! - `build_prompt` - 模块模板 + 参考资料 + 答案
//! - `parse_response` - `(分数, 评语)`，永不失败
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一次作答"的完整处理流程
//! - `GradingState` - 单次评分的工作记录
//! - `GradingFlow` - 评分 → 反思 → 重评 状态机
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/registry` - 模块标识 → 配置好的流程
//! - `orchestrator/grader` - 应用门面、超时、作答折算
//!
//! 纯数据（`GradingModule`、文档、请求、结果）放在 `models/`

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

pub use clients::{ModelClient, OpenAiModelClient};
pub use config::{Config, EmbeddingProvider};
pub use error::{AppResult, GradingError};
pub use infrastructure::{Embedder, HashingEmbedder, IndexStore, OllamaEmbedder};
pub use models::{
    GradedSubmission, GradingModule, GradingRequest, GradingResult, ReferenceDocument, Submission,
};
pub use orchestrator::{Grader, ModuleRegistry, WarmUpReport};
pub use services::{ModuleIndex, RetrievalIndex};
pub use workflow::{GradingFlow, GradingState};
