//! 检索 - 能力层
//!
//! ## 职责
//!
//! - `RetrievalIndex`：在一个模块语料的向量上做精确最近邻搜索（平方 L2 距离）
//! - `build_or_load`：索引文件与语料、向量化实现仍匹配时直接复用，否则重新向量化并保存
//! - `ModuleIndex`：每个进程内同一模块的索引最多构建一次，之后只读共享给并发评分

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{AppResult, GradingError};
use crate::infrastructure::{Embedder, IndexArtifact, IndexStore};
use crate::models::{load_reference_corpus, GradingModule, ReferenceDocument};

/// 单个模块参考文档的平铺 L2 索引
///
/// `vectors[i]` 是 `documents[i]` 的向量，两者长度始终相同，每个向量都是 `dimension` 维
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    documents: Vec<ReferenceDocument>,
}

/// 一条搜索命中
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub document: &'a ReferenceDocument,
    /// 与查询的欧氏距离平方
    pub distance: f32,
}

impl RetrievalIndex {
    pub fn new(
        dimension: usize,
        vectors: Vec<Vec<f32>>,
        documents: Vec<ReferenceDocument>,
    ) -> AppResult<Self> {
        if vectors.len() != documents.len() {
            return Err(GradingError::embedding_unavailable(
                "index",
                format!(
                    "{} 个向量对应 {} 条文档",
                    vectors.len(),
                    documents.len()
                ),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(GradingError::DimensionMismatch {
                expected: dimension,
                got: bad.len(),
            });
        }

        Ok(Self {
            dimension,
            vectors,
            documents,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[ReferenceDocument] {
        &self.documents
    }

    /// 最近的 `min(k, len)` 条文档及距离，由近到远；距离相同时保持语料顺序
    pub fn nearest(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor<'_>>> {
        if query.len() != self.dimension {
            return Err(GradingError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, vector)| (pos, squared_l2(query, vector)))
            .collect();

        // 稳定排序：距离相同保持语料顺序
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(pos, distance)| Neighbor {
                document: &self.documents[pos],
                distance,
            })
            .collect())
    }

    /// 最近的 `min(k, len)` 条文档，由近到远
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ReferenceDocument>> {
        Ok(self
            .nearest(query, k)?
            .into_iter()
            .map(|n| n.document.clone())
            .collect())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// 对所有文档的 id、题目 ID 和内容计算 blake3 指纹
pub fn corpus_fingerprint(documents: &[ReferenceDocument]) -> String {
    let mut hasher = blake3::Hasher::new();
    for doc in documents {
        hasher.update(&(doc.id as u64).to_le_bytes());
        hasher.update(doc.metadata.question_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(doc.content.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

/// 加载或构建模块索引
///
/// 已保存的索引与语料、向量化实现仍匹配时直接加载；否则向量化语料、构建索引并保存
///
/// # 错误
/// - `CorpusLoad`：语料文件缺失或格式错误
/// - `EmbeddingUnavailable`：向量化失败
pub async fn build_or_load(
    module: GradingModule,
    corpus_path: &std::path::Path,
    store: &IndexStore,
    embedder: &dyn Embedder,
) -> AppResult<RetrievalIndex> {
    let documents = load_reference_corpus(corpus_path).await?;
    let fingerprint = corpus_fingerprint(&documents);
    let embedder_name = embedder.name();
    let artifact_path = store.artifact_path(module);

    if let Some(artifact) = store.load(&artifact_path).await? {
        if artifact.embedder == embedder_name && artifact.corpus_fingerprint == fingerprint {
            match RetrievalIndex::new(artifact.dimension, artifact.vectors, artifact.documents) {
                Ok(index) => {
                    info!(
                        "📂 [{}] 加载已有索引（{} 条文档）",
                        module,
                        index.len()
                    );
                    return Ok(index);
                }
                Err(e) => warn!("⚠️ [{}] 索引文件内容不一致: {}", module, e),
            }
        } else {
            info!(
                "[{}] 索引已过期（向量化实现或语料有变化），重新构建",
                module
            );
        }
    }

    info!("🔨 [{}] 使用 {} 构建新索引", module, embedder_name);

    let texts: Vec<String> = documents.iter().map(|doc| doc.content.clone()).collect();
    let vectors = embedder.embed(&texts).await?;
    let dimension = vectors.first().map(Vec::len).unwrap_or(0);
    if dimension == 0 {
        return Err(GradingError::embedding_unavailable(
            embedder_name,
            "向量化返回了空向量",
        ));
    }

    let index = RetrievalIndex::new(dimension, vectors, documents)?;

    let artifact = IndexArtifact {
        embedder: embedder_name,
        corpus_fingerprint: fingerprint,
        dimension,
        vectors: index.vectors.clone(),
        documents: index.documents.clone(),
    };
    if let Err(e) = store.save(&artifact_path, &artifact).await {
        // 内存中的索引仍可用
        warn!("⚠️ [{}] 索引保存失败: {}", module, e);
    }

    Ok(index)
}

// ========== 模块共享索引 ==========

enum IndexSource {
    Corpus {
        corpus_path: PathBuf,
        store: IndexStore,
    },
    Prebuilt,
}

/// 模块检索索引，首次使用时构建，之后共享
///
/// - 并发的首批调用方等待同一次构建
/// - 构建失败不会被缓存，下一个请求会重新尝试
pub struct ModuleIndex {
    module: GradingModule,
    source: IndexSource,
    cell: OnceCell<Arc<RetrievalIndex>>,
}

impl ModuleIndex {
    /// 由语料文件和索引存储支撑的索引
    pub fn new(module: GradingModule, corpus_path: impl Into<PathBuf>, store: IndexStore) -> Self {
        Self {
            module,
            source: IndexSource::Corpus {
                corpus_path: corpus_path.into(),
                store,
            },
            cell: OnceCell::new(),
        }
    }

    /// 已构建好的索引
    pub fn prebuilt(module: GradingModule, index: RetrievalIndex) -> Self {
        Self {
            module,
            source: IndexSource::Prebuilt,
            cell: OnceCell::new_with(Some(Arc::new(index))),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get_or_build(&self, embedder: &dyn Embedder) -> AppResult<Arc<RetrievalIndex>> {
        self.cell
            .get_or_try_init(|| async {
                match &self.source {
                    IndexSource::Corpus { corpus_path, store } => {
                        debug!("[{}] 从 {} 准备索引", self.module, corpus_path.display());
                        build_or_load(self.module, corpus_path, store, embedder)
                            .await
                            .map(Arc::new)
                    }
                    IndexSource::Prebuilt => Err(GradingError::corpus_load(
                        self.module.name(),
                        "预构建索引缺失",
                    )),
                }
            })
            .await
            .cloned()
    }
}
