//! 编排层 (Orchestration Layer)
//!
//! ## 职责
//!
//! 路由与应用生命周期：决定由 *哪个* 模块的流程处理请求，并包裹整次评分；
//! 本层自己不做任何评分决策
//!
//! ## 模块划分
//!
//! ### `registry` - 模块注册表
//! - 模块标识到 `GradingModule` 的静态映射 (phf)
//! - 每个模块持有一个 `GradingFlow`
//! - 路由失败时列出所有支持的标识
//! - 并发预热索引，逐模块汇报结果
//!
//! ### `grader` - 应用门面
//! - 从 `Config` 初始化
//! - `grade` / `grade_submission`，可选整次评分超时
//!
//! ## 层次关系
//!
//! ```text
//! grader (请求 / 作答)
//!     ↓
//! registry (module id → GradingFlow)
//!     ↓
//! workflow::GradingFlow (单次作答，反思循环)
//!     ↓
//! services (retrieval / prompt / parser)  +  clients (ModelClient)
//!     ↓
//! infrastructure (Embedder / IndexStore)
//! ```

pub mod grader;
pub mod registry;

pub use grader::Grader;
pub use registry::{lookup_module, supported_module_ids, ModuleRegistry, WarmUpReport};
