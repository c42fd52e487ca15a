//! 参考语料加载器
//!
//! 语料文件是 JSON 数组，每条记录至少包含 `Question`、`Model Answer`、`Question ID`

use crate::error::{AppResult, GradingError};
use crate::models::document::{CorpusRecord, ReferenceDocument};
use std::path::Path;
use tokio::fs;

/// 加载模块语料文件并转换为参考文档
///
/// 没有参考答案的记录会被跳过；一条文档都没有的文件视为错误
pub async fn load_reference_corpus(corpus_path: &Path) -> AppResult<Vec<ReferenceDocument>> {
    let path_str = corpus_path.display().to_string();

    let content = fs::read_to_string(corpus_path)
        .await
        .map_err(|e| GradingError::corpus_load(&path_str, e))?;

    let documents = parse_reference_corpus(&content).map_err(|reason| GradingError::CorpusLoad {
        path: path_str.clone(),
        reason,
    })?;

    tracing::info!("📚 从 {} 加载了 {} 条参考文档", path_str, documents.len());

    Ok(documents)
}

/// 解析语料 JSON（记录数组）为参考文档
pub fn parse_reference_corpus(content: &str) -> Result<Vec<ReferenceDocument>, String> {
    let records: Vec<CorpusRecord> =
        serde_json::from_str(content).map_err(|e| format!("语料 JSON 格式错误: {}", e))?;
    let total = records.len();

    let documents: Vec<ReferenceDocument> = records
        .iter()
        .filter_map(|record| {
            let answer = record.model_answer.as_deref()?.trim();
            (!answer.is_empty()).then_some((record, answer))
        })
        .enumerate()
        .map(|(id, (record, answer))| {
            ReferenceDocument::new(id, &record.question, answer, record.question_id.clone())
        })
        .collect();

    if documents.is_empty() {
        return Err(format!("{} 条记录均没有参考答案 (Model Answer)", total));
    }

    if documents.len() < total {
        tracing::debug!("跳过 {} 条没有参考答案的记录", total - documents.len());
    }

    Ok(documents)
}
