//! 流程层与编排层单元测试共用的测试替身

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::clients::ModelClient;
use crate::error::{AppResult, GradingError};
use crate::infrastructure::{Embedder, HashingEmbedder};
use crate::models::{GradingModule, ReferenceDocument};
use crate::services::{ModuleIndex, RetrievalIndex};
use crate::workflow::GradingFlow;

enum Script {
    Always(String),
    Sequence(Mutex<VecDeque<String>>),
    ThenFail(Mutex<VecDeque<String>>),
    Fail,
}

/// 按脚本返回固定响应并记录提示词的模型客户端
pub struct ScriptedModel {
    script: Script,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn with(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn always(response: &str) -> Arc<Self> {
        Self::with(Script::Always(response.to_string()))
    }

    /// 依次返回；队列用完后重复最后一条
    pub fn sequence(responses: &[&str]) -> Arc<Self> {
        Self::with(Script::Sequence(Mutex::new(
            responses.iter().map(|r| r.to_string()).collect(),
        )))
    }

    /// 依次返回，用完后每次调用都失败
    pub fn then_fail(responses: &[&str]) -> Arc<Self> {
        Self::with(Script::ThenFail(Mutex::new(
            responses.iter().map(|r| r.to_string()).collect(),
        )))
    }

    pub fn failing() -> Arc<Self> {
        Self::with(Script::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn invoke(&self, prompt: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.script {
            Script::Always(response) => Ok(response.clone()),
            Script::Sequence(queue) => {
                let mut queue = queue.lock().unwrap();
                let response = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                Ok(response.unwrap_or_default())
            }
            Script::ThenFail(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GradingError::model_invocation("scripted", "connection reset")),
            Script::Fail => Err(GradingError::model_invocation(
                "scripted",
                "connection refused",
            )),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// 统计调用次数的哈希向量化
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dimension: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: HashingEmbedder::new(dimension).unwrap(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(texts).await
    }
}

pub fn database_documents() -> Vec<ReferenceDocument> {
    [
        ("What is a foreign key?", "A column that references the primary key of another table."),
        ("What is a primary key?", "A column that uniquely identifies each row of a table."),
        ("What is normalization?", "Organising tables to reduce redundancy."),
        ("What is a join?", "Combining rows of two tables on a related column."),
    ]
    .iter()
    .enumerate()
    .map(|(id, (q, a))| ReferenceDocument::new(id, q, a, (id + 1).to_string()))
    .collect()
}

/// 用同维度的哈希向量化预先构建的索引
pub fn prebuilt_index(module: GradingModule, dimension: usize) -> ModuleIndex {
    let documents = database_documents();
    let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
    let embedder = HashingEmbedder::new(dimension).unwrap();
    let vectors = futures::executor::block_on(embedder.embed(&texts)).unwrap();
    ModuleIndex::prebuilt(module, RetrievalIndex::new(dimension, vectors, documents).unwrap())
}

pub fn flow_for(
    module: GradingModule,
    model: Arc<ScriptedModel>,
    embedder: Arc<CountingEmbedder>,
) -> GradingFlow {
    let dimension = embedder.inner.dimension();
    GradingFlow::new(module, prebuilt_index(module, dimension), embedder, model, 1)
}

pub fn database_flow(model: Arc<ScriptedModel>, embedder: Arc<CountingEmbedder>) -> GradingFlow {
    flow_for(GradingModule::Database, model, embedder)
}
