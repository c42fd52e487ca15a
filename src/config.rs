use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppResult, GradingError};

/// 工作目录下默认查找的 TOML 配置文件
pub const DEFAULT_CONFIG_FILE: &str = "grader.toml";

/// 检索索引所用的向量化方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// 离线特征哈希向量化
    Hashing,
    /// Ollama `/api/embed` 接口
    Ollama,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(EmbeddingProvider::Hashing),
            "ollama" => Ok(EmbeddingProvider::Ollama),
            other => Err(GradingError::Config(format!(
                "未知的向量化方式 '{}'，可选 'hashing' 或 'ollama'",
                other
            ))),
        }
    }
}

/// 评分配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型端点 ---
    /// 模型服务的 OpenAI 兼容地址
    pub llm_api_base_url: String,
    pub llm_api_key: String,
    pub max_tokens: u32,
    // --- 向量化 ---
    pub embedding_provider: EmbeddingProvider,
    pub embedding_base_url: String,
    pub embedding_model: String,
    /// 哈希向量维度
    pub embedding_dimension: usize,
    // --- 文件 ---
    /// 存放 `<slug>_questions.json` 语料的目录
    pub data_dir: PathBuf,
    /// 存放 `<slug>_index/index.bin` 索引文件的目录
    pub index_dir: PathBuf,
    // --- 运行时 ---
    /// 每个模块同时进行的模型调用数
    pub max_concurrent_model_calls: usize,
    /// 单次评分的整体超时
    pub grading_timeout_secs: Option<u64>,
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_base_url: "http://localhost:11434/v1".to_string(),
            llm_api_key: "ollama".to_string(),
            max_tokens: 1024,
            embedding_provider: EmbeddingProvider::Hashing,
            embedding_base_url: "http://localhost:11434".to_string(),
            embedding_model: "all-minilm".to_string(),
            embedding_dimension: 384,
            data_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("indexes"),
            max_concurrent_model_calls: 1,
            grading_timeout_secs: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// 优先级从低到高：默认值 → TOML 文件（`GRADER_CONFIG` 或 `grader.toml`，存在时）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("GRADER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let base = if path.exists() {
            Self::from_file(&path)?
        } else {
            debug!("未找到配置文件 {}，使用默认配置", path.display());
            Self::default()
        };

        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 解析 TOML 配置文件，缺省的键保留默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GradingError::Config(format!("无法读取 {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| GradingError::Config(format!("{} ({})", e, path.display())))
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| GradingError::Config(format!("TOML 格式错误: {}", e)))
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> Self {
        Self {
            llm_api_base_url: env_string("LLM_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(self.llm_api_key),
            max_tokens: env_parse("LLM_MAX_TOKENS").unwrap_or(self.max_tokens),
            embedding_provider: env_parse("EMBEDDING_PROVIDER").unwrap_or(self.embedding_provider),
            embedding_base_url: env_string("EMBEDDING_BASE_URL").unwrap_or(self.embedding_base_url),
            embedding_model: env_string("EMBEDDING_MODEL").unwrap_or(self.embedding_model),
            embedding_dimension: env_parse("EMBEDDING_DIMENSION")
                .unwrap_or(self.embedding_dimension),
            data_dir: env_string("DATA_DIR").map(PathBuf::from).unwrap_or(self.data_dir),
            index_dir: env_string("INDEX_DIR").map(PathBuf::from).unwrap_or(self.index_dir),
            max_concurrent_model_calls: env_parse("MAX_CONCURRENT_MODEL_CALLS")
                .unwrap_or(self.max_concurrent_model_calls),
            grading_timeout_secs: env_parse("GRADING_TIMEOUT_SECS").or(self.grading_timeout_secs),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_model_calls == 0 {
            return Err(GradingError::Config(
                "max_concurrent_model_calls 至少为 1".to_string(),
            ));
        }
        if self.embedding_provider == EmbeddingProvider::Hashing && self.embedding_dimension == 0 {
            return Err(GradingError::Config(
                "embedding_dimension 至少为 1".to_string(),
            ));
        }
        if self.grading_timeout_secs == Some(0) {
            return Err(GradingError::Config(
                "grading_timeout_secs 设置时必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("⚠️ 忽略 {}={:?}：无法解析", name, raw);
            None
        }
    }
}
