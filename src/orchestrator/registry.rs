//! 模块注册表 - 编排层
//!
//! 从模块标识静态路由到配置完整的评分流程。注册表为每个模块持有一个
//! `GradingFlow`，索引、模型客户端和并发许可都归流程所有，不放在全局变量里

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use phf::phf_map;
use tracing::{error, info};

use crate::clients::OpenAiModelClient;
use crate::config::Config;
use crate::error::{AppResult, GradingError};
use crate::infrastructure::{build_embedder, IndexStore};
use crate::models::GradingModule;
use crate::services::ModuleIndex;
use crate::workflow::GradingFlow;

/// `route` 接受的精确路由键
static MODULE_IDS: phf::Map<&'static str, GradingModule> = phf_map! {
    "C Programming Module" => GradingModule::CProgramming,
    "Database Module" => GradingModule::Database,
    "Python Programming" => GradingModule::PythonProgramming,
    "Risk management" => GradingModule::RiskManagement,
    "OOP Java Module" => GradingModule::OopJava,
};

/// 只解析模块标识，不涉及任何流程
pub fn lookup_module(module_id: &str) -> AppResult<GradingModule> {
    MODULE_IDS
        .get(module_id)
        .copied()
        .ok_or_else(|| GradingError::UnsupportedModule {
            module: module_id.to_string(),
            supported: supported_module_ids(),
        })
}

/// 所有已知模块标识，按固定顺序
pub fn supported_module_ids() -> Vec<&'static str> {
    GradingModule::ALL.iter().map(|m| m.name()).collect()
}

/// `warm_up` 汇报的逐模块初始化结果
#[derive(Debug)]
pub struct WarmUpReport {
    pub ready: Vec<GradingModule>,
    pub failed: Vec<(GradingModule, GradingError)>,
}

impl WarmUpReport {
    pub fn all_ready(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ModuleRegistry {
    flows: HashMap<GradingModule, Arc<GradingFlow>>,
}

impl ModuleRegistry {
    /// 按配置为每个已知模块装配一个流程
    ///
    /// 这里不构建索引，见 `warm_up`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let embedder = build_embedder(config)?;
        let store = IndexStore::new(&config.index_dir);

        let flows = GradingModule::ALL
            .iter()
            .map(|&module| {
                let corpus_path = config.data_dir.join(module.corpus_file_name());
                let index = ModuleIndex::new(module, corpus_path, store.clone());
                let model = Arc::new(OpenAiModelClient::for_module(config, module));
                GradingFlow::new(
                    module,
                    index,
                    embedder.clone(),
                    model,
                    config.max_concurrent_model_calls,
                )
            })
            .collect();

        info!(
            "📚 已注册 {} 个模块 (向量化: {})",
            GradingModule::ALL.len(),
            embedder.name()
        );
        Ok(Self::from_flows(flows))
    }

    /// 由预先装配的流程组成注册表；同一模块后出现的流程覆盖先出现的
    pub fn from_flows(flows: Vec<GradingFlow>) -> Self {
        Self {
            flows: flows
                .into_iter()
                .map(|flow| (flow.module(), Arc::new(flow)))
                .collect(),
        }
    }

    /// 查找 `module_id` 对应的流程
    ///
    /// # 错误
    /// 未知名称，或已知模块但没有注册流程时，返回列出全部已知标识的 `UnsupportedModule`
    pub fn route(&self, module_id: &str) -> AppResult<Arc<GradingFlow>> {
        let module = lookup_module(module_id)?;
        self.flows
            .get(&module)
            .cloned()
            .ok_or_else(|| GradingError::UnsupportedModule {
                module: module_id.to_string(),
                supported: self.supported_modules(),
            })
    }

    /// 已注册的模块标识，按固定顺序
    pub fn supported_modules(&self) -> Vec<&'static str> {
        GradingModule::ALL
            .iter()
            .filter(|m| self.flows.contains_key(*m))
            .map(|m| m.name())
            .collect()
    }

    /// 并发构建所有已注册模块的索引
    ///
    /// 单个模块失败只记录在报告里，不影响其他模块
    pub async fn warm_up(&self) -> WarmUpReport {
        let mut flows: Vec<&Arc<GradingFlow>> = self.flows.values().collect();
        flows.sort_by_key(|flow| flow.module().slug());

        let outcomes = join_all(flows.iter().map(|flow| async move {
            (flow.module(), flow.prepare().await)
        }))
        .await;

        let mut report = WarmUpReport {
            ready: Vec::new(),
            failed: Vec::new(),
        };
        for (module, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    info!("✅ [{}] 索引就绪", module);
                    report.ready.push(module);
                }
                Err(e) => {
                    error!("❌ [{}] 初始化失败: {}", module, e);
                    report.failed.push((module, e));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::test_support::{flow_for, CountingEmbedder, ScriptedModel};
    use tokio_test::{assert_err, assert_ok};

    fn full_registry() -> ModuleRegistry {
        ModuleRegistry::from_flows(
            GradingModule::ALL
                .iter()
                .map(|&m| {
                    flow_for(
                        m,
                        ScriptedModel::always("Score: 5\nFeedback: ok"),
                        CountingEmbedder::new(32),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn every_known_identifier_routes_to_its_module() {
        let registry = full_registry();
        for module in GradingModule::ALL {
            let flow = assert_ok!(registry.route(module.name()));
            assert_eq!(flow.module(), module);
        }
    }

    #[test]
    fn unknown_module_lists_all_identifiers() {
        let registry = full_registry();
        let err = assert_err!(registry.route("Quantum Module"));

        let message = err.to_string();
        assert!(message.contains("Quantum Module"));
        for id in supported_module_ids() {
            assert!(message.contains(id), "missing {} in {}", id, message);
        }
    }

    #[test]
    fn routing_is_exact_match() {
        let registry = full_registry();
        assert!(registry.route("database module").is_err());
        assert!(registry.route("Database Module ").is_err());
        assert!(registry.route("Risk Management").is_err());
    }

    #[test]
    fn missing_flow_is_unsupported() {
        let registry = ModuleRegistry::from_flows(vec![flow_for(
            GradingModule::Database,
            ScriptedModel::always("Score: 5"),
            CountingEmbedder::new(32),
        )]);

        assert_eq!(registry.supported_modules(), vec!["Database Module"]);
        let err = assert_err!(registry.route("OOP Java Module"));
        assert!(matches!(err, GradingError::UnsupportedModule { .. }));
    }

    #[tokio::test]
    async fn warm_up_reports_missing_corpora_per_module() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(
            data_dir.join("database_questions.json"),
            r#"[{"Question": "What is a view?", "Model Answer": "A stored query.", "Question ID": 1}]"#,
        )
        .unwrap();

        let config = Config {
            data_dir,
            index_dir: dir.path().join("indexes"),
            embedding_dimension: 32,
            ..Config::default()
        };
        let registry = assert_ok!(ModuleRegistry::from_config(&config));

        let report = registry.warm_up().await;

        assert_eq!(report.ready, vec![GradingModule::Database]);
        assert_eq!(report.failed.len(), 4);
        assert!(report.failed.iter().all(|(_, e)| e.is_setup_failure()));
        assert!(!report.all_ready());
        assert!(assert_ok!(registry.route("Database Module")).is_ready());
    }
}
