//! OpenAI兼容的 chat/completions 后端（OpenAI、DeepSeek、智谱AI）
//!
//! 智谱AI在连接检查时会列出账号可用的模型，配置的模型不可用时自动改用候选模型。

// 标准库导入
use std::sync::OnceLock;

// 第三方crate导入
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// 本地模块导入
use super::{build_http_client, ensure_success, join_url};
use crate::api_constants::{api_config, model_config, prompt_config};
use crate::config::TranslatorConfig;
use crate::error::Result;
use crate::translation_error;
use crate::translator::{create_translation_prompt, enhance_translation, Provider, Translate};

/// chat/completions 请求
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// 对话消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// chat/completions 响应
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// models 列表响应
#[derive(Debug, Default, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

impl ModelsResponse {
    pub fn ids(&self) -> Vec<&str> {
        self.data.iter().map(|entry| entry.id.as_str()).collect()
    }
}

/// 配置的模型不在可用列表中时选出替代模型
///
/// 先按候选顺序查找，都不可用时取列表中的第一个。
/// 配置的模型可用或列表为空时返回 None。
pub fn select_fallback_model(
    configured: &str,
    available: &[&str],
    candidates: &[&str],
) -> Option<String> {
    if available.is_empty() || available.contains(&configured) {
        return None;
    }
    candidates
        .iter()
        .find(|candidate| available.contains(*candidate))
        .or_else(|| available.first())
        .map(|model| model.to_string())
}

impl ChatCompletionResponse {
    /// 取第一个候选的文本
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// OpenAI兼容后端
pub struct OpenAiCompatTranslator {
    client: Client,
    provider: Provider,
    base_url: String,
    endpoint: String,
    api_key: String,
    model: String,
    // 连接检查后选定的替代模型
    fallback_model: OnceLock<String>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiCompatTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let provider = config.provider();
        let base_url = config
            .base_url()
            .unwrap_or_else(|| default_base_url(provider));
        let api_key = config
            .api_key()
            .ok_or_else(|| translation_error!(config, "api_key", format!("{} 需要API密钥", provider)))?;

        Ok(Self {
            client: build_http_client(config)?,
            provider,
            base_url: base_url.to_string(),
            endpoint: join_url(base_url, "chat/completions"),
            api_key: api_key.to_string(),
            model: config.model().to_string(),
            fallback_model: OnceLock::new(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        })
    }

    /// 实际请求使用的模型
    pub fn model(&self) -> &str {
        self.fallback_model.get().unwrap_or(&self.model)
    }

    /// 根据可用模型列表决定是否改用替代模型
    pub fn apply_model_listing(&self, listing: &ModelsResponse) {
        let available = listing.ids();
        info!(
            "✓ {} 可用模型: {}",
            self.provider,
            available.iter().take(3).copied().collect::<Vec<_>>().join(", ")
        );

        match select_fallback_model(&self.model, &available, model_config::ZHIPU_FALLBACK_MODELS) {
            Some(model) => {
                warn!("⚠️  模型 {} 不可用，改用 {}", self.model, model);
                let _ = self.fallback_model.set(model);
            }
            None if available.is_empty() => warn!("⚠️  {} 没有返回可用模型列表", self.provider),
            None => {}
        }
    }

    /// 构建请求体
    pub fn build_request(&self, text: &str, context: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(self.provider).to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: create_translation_prompt(text.trim(), context),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn default_base_url(provider: Provider) -> &'static str {
    match provider {
        Provider::DeepSeek => api_config::DEEPSEEK_BASE_URL,
        Provider::Zhipu => api_config::ZHIPU_BASE_URL,
        _ => api_config::OPENAI_BASE_URL,
    }
}

fn system_prompt(provider: Provider) -> &'static str {
    match provider {
        Provider::DeepSeek => prompt_config::DEEPSEEK_SYSTEM_PROMPT,
        Provider::Zhipu => prompt_config::ZHIPU_SYSTEM_PROMPT,
        _ => prompt_config::OPENAI_SYSTEM_PROMPT,
    }
}

#[async_trait]
impl Translate for OpenAiCompatTranslator {
    fn name(&self) -> &str {
        self.provider.as_str()
    }

    async fn attempt_translate(&self, text: &str, context: &str) -> Result<String> {
        let request = self.build_request(text, context);
        debug!("📤 {} 请求: {} 字符, 上下文 {}", self.provider, text.len(), context);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response, &self.endpoint).await?;
        let body: ChatCompletionResponse = response.json().await?;

        let translated = body
            .first_text()
            .map(|content| enhance_translation(text, content))
            .unwrap_or_default();
        if translated.is_empty() {
            return Err(translation_error!(empty, self.provider));
        }
        Ok(translated)
    }

    async fn check_connection(&self) -> Result<()> {
        if self.provider != Provider::Zhipu {
            return Ok(());
        }

        // 模型列表只用于选择模型，获取失败不影响翻译
        let endpoint = join_url(&self.base_url, "models");
        let listing = async {
            let response = self
                .client
                .get(&endpoint)
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let response = ensure_success(response, &endpoint).await?;
            Ok::<ModelsResponse, crate::error::TranslationError>(response.json().await?)
        };
        match listing.await {
            Ok(listing) => self.apply_model_listing(&listing),
            Err(e) => warn!("⚠️  无法获取模型列表: {}", e),
        }
        info!("✓ 已连接 {} (模型: {})", self.provider, self.model());
        Ok(())
    }
}
