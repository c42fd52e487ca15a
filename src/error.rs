//! 评分错误类型
//!
//! 库内所有可失败的操作都返回 [`AppResult`]。错误分三类：
//! 模块级的初始化失败（对该模块的所有请求都失败）、单次评分失败，
//! 以及永不失败的响应解析。

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 评分错误
#[derive(Debug, Error)]
pub enum GradingError {
    /// 必填字段缺失或为空
    #[error("输入无效: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// 参考语料读取失败或格式错误
    #[error("参考语料加载失败 ({path}): {reason}")]
    CorpusLoad { path: String, reason: String },

    /// 文本向量化不可用
    #[error("向量化不可用 ({embedder}): {reason}")]
    EmbeddingUnavailable { embedder: String, reason: String },

    /// 模型端点不可达，或返回了无法使用的响应
    #[error("模型调用失败 (模型: {model}): {source}")]
    ModelInvocation {
        model: String,
        #[source]
        source: BoxError,
    },

    /// 该模块名下没有注册评分流程
    #[error("不支持的模块: {module}，支持的模块: {supported:?}")]
    UnsupportedModule {
        module: String,
        supported: Vec<&'static str>,
    },

    /// 索引文件读写失败
    #[error("索引文件错误 ({path}): {source}")]
    IndexArtifact {
        path: String,
        #[source]
        source: BoxError,
    },

    /// 向量维度与索引不一致
    #[error("向量维度不匹配: 期望 {expected}，实际 {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl GradingError {
    /// 是否为模块级初始化失败
    ///
    /// 这类错误在原因消除之前，对该模块的每个请求都会以同样方式失败。
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            GradingError::CorpusLoad { .. }
                | GradingError::EmbeddingUnavailable { .. }
                | GradingError::IndexArtifact { .. }
        )
    }

    // ========== 便捷构造函数 ==========

    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        GradingError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn corpus_load(path: impl Into<String>, reason: impl ToString) -> Self {
        GradingError::CorpusLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn embedding_unavailable(embedder: impl Into<String>, reason: impl ToString) -> Self {
        GradingError::EmbeddingUnavailable {
            embedder: embedder.into(),
            reason: reason.to_string(),
        }
    }

    pub fn model_invocation(model: impl Into<String>, source: impl Into<BoxError>) -> Self {
        GradingError::ModelInvocation {
            model: model.into(),
            source: source.into(),
        }
    }

    pub fn index_artifact(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GradingError::IndexArtifact {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// 库内统一的 Result 类型
pub type AppResult<T> = Result<T, GradingError>;
