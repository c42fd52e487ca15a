//! 模型客户端
//!
//! 评分核心只需要"发送提示词，拿回文本"。重试和超时在上层处理，
//! 每次调用只发一个请求，所有失败都报告为 [`GradingError::ModelInvocation`]。

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, GradingError};
use crate::models::GradingModule;

/// 用生成模型执行一条提示词的能力
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// 发送 `prompt`，返回模型原始文本
    async fn invoke(&self, prompt: &str) -> AppResult<String>;

    /// 模型名称，用于日志和错误信息
    fn model_name(&self) -> &str;
}

/// OpenAI 兼容聊天接口的客户端（Ollama 在 `/v1` 提供）
pub struct OpenAiModelClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiModelClient {
    /// 使用模块的模型和采样温度创建客户端
    pub fn for_module(config: &Config, module: GradingModule) -> Self {
        Self::new(config, module.model_name(), module.temperature())
    }

    pub fn new(config: &Config, model_name: impl Into<String>, temperature: f32) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: model_name.into(),
            temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn build_messages(&self, prompt: &str) -> AppResult<Vec<ChatCompletionRequestMessage>> {
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| GradingError::model_invocation(&self.model_name, e))?;
        Ok(vec![ChatCompletionRequestMessage::User(user_msg)])
    }
}

#[async_trait]
impl ModelClient for OpenAiModelClient {
    async fn invoke(&self, prompt: &str) -> AppResult<String> {
        debug!("🤖 调用模型 {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.chars().count());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(self.build_messages(prompt)?)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| GradingError::model_invocation(&self.model_name, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("❌ 模型调用失败 ({}): {}", self.model_name, e);
            GradingError::model_invocation(&self.model_name, e)
        })?;

        debug!("✓ 模型调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| GradingError::model_invocation(&self.model_name, "模型返回为空"))?;

        Ok(content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_profile_drives_client_settings() {
        let client = OpenAiModelClient::for_module(&Config::default(), GradingModule::OopJava);
        assert_eq!(client.model_name(), "codellama:13b");
        assert!((client.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(client.max_tokens, 1024);
    }

    #[test]
    fn prompt_is_sent_as_single_user_message() {
        let client = OpenAiModelClient::for_module(&Config::default(), GradingModule::Database);
        let messages = client.build_messages("Score this").unwrap();
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::User(_)));
    }

    /// 需要本地运行 Ollama 并已拉取 `mistral:7b`
    #[tokio::test]
    #[ignore]
    async fn live_model_returns_text() {
        let _ = tracing_subscriber::fmt::try_init();
        let client = OpenAiModelClient::for_module(&Config::load().unwrap(), GradingModule::Database);
        let response = client
            .invoke("Reply with exactly two lines:\nScore: 5\nFeedback: ok")
            .await
            .unwrap();
        println!("{}", response);
        assert!(!response.is_empty());
    }
}
