//! 文本向量化 - 基础设施层
//!
//! 只暴露"把文本变成向量"的能力。
//!
//! 索引和查询必须使用同一个向量化实现，因此每个实现都提供稳定的
//! [`Embedder::name`]，随索引文件一起保存。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, EmbeddingProvider};
use crate::error::{AppResult, GradingError};

/// 确定性的文本向量化能力
#[async_trait]
pub trait Embedder: Send + Sync {
    /// 向量空间标识（提供方、模型、维度）
    fn name(&self) -> String;

    /// 按顺序向量化每段文本
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// 向量化单条查询
    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| GradingError::embedding_unavailable(self.name(), "未返回向量"))
    }
}

/// 根据配置创建向量化实现
pub fn build_embedder(config: &Config) -> AppResult<Arc<dyn Embedder>> {
    match config.embedding_provider {
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(config.embedding_dimension)?)),
        EmbeddingProvider::Ollama => Ok(Arc::new(OllamaEmbedder::new(
            &config.embedding_base_url,
            &config.embedding_model,
        ))),
    }
}

// ========== 特征哈希向量化 ==========

/// 离线词袋向量化
///
/// - 词元：小写的字母数字串，长度至少 2
/// - 每个词元经 blake3 哈希落入 `dimension` 个桶之一，符号也由哈希决定
/// - 权重 `1 + ln(tf)`，最后做 L2 归一化
/// - 没有任何词元的文本得到零向量
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> AppResult<Self> {
        if dimension == 0 {
            return Err(GradingError::embedding_unavailable(
                "hashing",
                "维度至少为 1",
            ));
        }
        Ok(Self { dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut term_counts: HashMap<String, u32> = HashMap::new();
        for token in tokenize(text) {
            *term_counts.entry(token).or_insert(0) += 1;
        }

        let mut vector = vec![0.0f32; self.dimension];
        for (token, count) in &term_counts {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign * (1.0 + (*count as f32).ln());
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> String {
        format!("hashing-{}", self.dimension)
    }

    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(|token| token.to_lowercase())
}

// ========== Ollama 向量化 ==========

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// 基于 Ollama `/api/embed` 接口的向量化
pub struct OllamaEmbedder {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> String {
        format!("ollama:{}", self.model)
    }

    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("使用 {} 向量化 {} 段文本", self.model, texts.len());

        let response = self
            .http
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GradingError::embedding_unavailable(self.name(), e))?;

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| GradingError::embedding_unavailable(self.name(), e))?;

        if body.embeddings.len() != texts.len() {
            return Err(GradingError::embedding_unavailable(
                self.name(),
                format!(
                    "请求 {} 个向量，返回 {} 个",
                    texts.len(),
                    body.embeddings.len()
                ),
            ));
        }

        Ok(body.embeddings)
    }
}
