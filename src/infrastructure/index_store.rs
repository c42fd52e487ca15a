//! 索引文件存储 - 基础设施层
//!
//! 持有每个模块检索索引在磁盘上的位置，只暴露"存在 / 读取 / 保存"能力，
//! 不关心索引如何构建。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{AppResult, GradingError};
use crate::models::{GradingModule, ReferenceDocument};

const ARTIFACT_FILE_NAME: &str = "index.bin";

/// 检索索引的持久化形式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexArtifact {
    /// 生成 `vectors` 的向量化实现
    pub embedder: String,
    /// 构建索引时语料的 blake3 指纹
    pub corpus_fingerprint: String,
    pub dimension: usize,
    pub vectors: Vec<Vec<f32>>,
    pub documents: Vec<ReferenceDocument>,
}

/// 以配置的索引目录为根的索引文件存储
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<slug>_index/index.bin`
    pub fn artifact_path(&self, module: GradingModule) -> PathBuf {
        self.root
            .join(format!("{}_index", module.slug()))
            .join(ARTIFACT_FILE_NAME)
    }

    /// 读取索引文件
    ///
    /// 文件不存在或无法解码时返回 `None`，由调用方重建索引
    pub async fn load(&self, path: &Path) -> AppResult<Option<IndexArtifact>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("索引文件不存在: {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(GradingError::index_artifact(path.display().to_string(), e)),
        };

        match bincode::deserialize::<IndexArtifact>(&bytes) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(e) => {
                warn!("⚠️ 索引文件无法解析，丢弃 {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// 保存索引文件
    ///
    /// 先写入同目录的临时文件再重命名覆盖，并发读取方只会看到旧文件或新文件
    pub async fn save(&self, path: &Path, artifact: &IndexArtifact) -> AppResult<()> {
        let path_str = path.display().to_string();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| GradingError::index_artifact(&path_str, e))?;
        }

        let bytes =
            bincode::serialize(artifact).map_err(|e| GradingError::index_artifact(&path_str, e))?;

        let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));
        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| GradingError::index_artifact(&path_str, e))?;
        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| GradingError::index_artifact(&path_str, e))?;

        debug!("💾 索引文件已保存 {} ({} 字节)", path_str, bytes.len());
        Ok(())
    }
}
