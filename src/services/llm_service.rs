//! LLM 服务 - 业务能力层
//!
//! 只负责"调用聊天模型"能力，不关心评分流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（自定义端点和模型）
//! - 每次请求都有超时，超时按传输错误处理

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AdapterError;

/// 单次回复的 token 上限
const MAX_REPLY_TOKENS: u32 = 1024;

/// LLM 服务
///
/// 职责：
/// - 发送一轮 system + user 对话并返回文本
/// - 不认识评分记录
/// - 不解析返回内容
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    timeout: Duration,
}

fn transport(e: impl std::fmt::Display) -> AdapterError {
    AdapterError::Transport(e.to_string())
}

impl LlmService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            // 评分需要可复现
            temperature: 0.0,
            timeout: Duration::from_secs(config.llm_timeout_secs.max(1)),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 组装一轮对话请求
    fn build_request(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<CreateChatCompletionRequest, AdapterError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);

        if let Some(system) = system_message {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(transport)?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(transport)?
                .into(),
        );

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(MAX_REPLY_TOKENS)
            .build()
            .map_err(transport)
    }

    /// 发送一轮对话
    ///
    /// # 返回
    /// 模型回复（已去除首尾空白）；回复为空时返回 [`AdapterError::EmptyResponse`]
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, AdapterError> {
        debug!(
            "调用 LLM API，模型: {}，用户消息 {} 字符",
            self.model_name,
            user_message.len()
        );

        let request = self.build_request(user_message, system_message)?;

        let response = match tokio::time::timeout(self.timeout, self.client.chat().create(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("LLM API 调用失败: {}", e);
                return Err(transport(e));
            }
            Err(_) => {
                warn!("LLM API 调用超时 ({} 秒)", self.timeout.as_secs());
                return Err(transport(format!("超时 ({} 秒)", self.timeout.as_secs())));
            }
        };

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let content = content.trim();
        if content.is_empty() {
            return Err(AdapterError::EmptyResponse);
        }
        debug!("LLM 回复 {} 字符", content.len());
        Ok(content.to_string())
    }
}
