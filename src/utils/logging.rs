//! 日志工具
//!
//! 初始化 subscriber，打印运行前后的横幅

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 安装全局 fmt subscriber
///
/// 设置了 `RUST_LOG` 时以它为准；否则为 `info`，`verbose` 时为 `debug`。
/// 重复调用不会出错
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 启动横幅
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 评分服务启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 模型端点: {}", config.llm_api_base_url);
    info!(
        "🧮 向量化: {:?} | 语料目录: {} | 索引目录: {}",
        config.embedding_provider,
        config.data_dir.display(),
        config.index_dir.display()
    );
    info!(
        "📊 每个模块并发模型调用数: {}",
        config.max_concurrent_model_calls
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最多保留的字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
