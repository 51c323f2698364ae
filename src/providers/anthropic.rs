//! Anthropic Messages 后端

// 第三方crate导入
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

// 本地模块导入
use super::{build_http_client, ensure_success, join_url};
use crate::api_constants::{api_config, service_config};
use crate::config::TranslatorConfig;
use crate::error::Result;
use crate::translation_error;
use crate::translator::{create_translation_prompt, enhance_translation, Provider, Translate};

/// Messages 请求
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

/// Messages 响应
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

/// 响应内容块
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}

impl MessagesResponse {
    /// 拼接所有文本块
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text.as_str())
            .collect()
    }
}

pub struct AnthropicTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let base_url = config.base_url().unwrap_or(api_config::ANTHROPIC_BASE_URL);
        let api_key = config
            .api_key()
            .ok_or_else(|| translation_error!(config, "api_key", "anthropic 需要API密钥"))?;

        Ok(Self {
            client: build_http_client(config)?,
            endpoint: join_url(base_url, "v1/messages"),
            api_key: api_key.to_string(),
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config
                .max_tokens()
                .unwrap_or(service_config::DEFAULT_MAX_TOKENS),
        })
    }

    pub fn build_request(&self, text: &str, context: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: create_translation_prompt(text.trim(), context),
            }],
        }
    }
}

#[async_trait]
impl Translate for AnthropicTranslator {
    fn name(&self) -> &str {
        Provider::Anthropic.as_str()
    }

    async fn attempt_translate(&self, text: &str, context: &str) -> Result<String> {
        let request = self.build_request(text, context);
        debug!("📤 anthropic 请求: {} 字符, 上下文 {}", text.len(), context);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", api_config::ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response, &self.endpoint).await?;
        let body: MessagesResponse = response.json().await?;

        let translated = enhance_translation(text, &body.text());
        if translated.is_empty() {
            return Err(translation_error!(empty, Provider::Anthropic));
        }
        Ok(translated)
    }
}
