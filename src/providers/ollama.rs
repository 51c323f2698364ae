//! 本地 Ollama 后端

// 第三方crate导入
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// 本地模块导入
use super::{build_http_client, ensure_success, join_url};
use crate::api_constants::api_config;
use crate::config::TranslatorConfig;
use crate::error::Result;
use crate::translation_error;
use crate::translator::{create_translation_prompt, enhance_translation, Provider, Translate};

/// /api/generate 请求
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// /api/generate 响应
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

/// /api/tags 响应
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

impl TagsResponse {
    /// 模型名按包含关系匹配（llama3 匹配 llama3:8b）
    pub fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|tag| tag.name.contains(model))
    }
}

pub struct OllamaTranslator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OllamaTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config
                .base_url()
                .unwrap_or(api_config::OLLAMA_BASE_URL)
                .to_string(),
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        })
    }

    pub fn build_request(&self, text: &str, context: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: create_translation_prompt(text.trim(), context),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        }
    }
}

#[async_trait]
impl Translate for OllamaTranslator {
    fn name(&self) -> &str {
        Provider::Ollama.as_str()
    }

    async fn attempt_translate(&self, text: &str, context: &str) -> Result<String> {
        let endpoint = join_url(&self.base_url, "api/generate");
        debug!("📤 ollama 请求: {} 字符, 上下文 {}", text.len(), context);

        let response = self
            .client
            .post(&endpoint)
            .json(&self.build_request(text, context))
            .send()
            .await?;
        let response = ensure_success(response, &endpoint).await?;
        let body: GenerateResponse = response.json().await?;

        let translated = enhance_translation(text, &body.response);
        if translated.is_empty() {
            return Err(translation_error!(empty, Provider::Ollama));
        }
        Ok(translated)
    }

    /// 服务不可达视为配置错误；模型缺失只给出提示
    async fn check_connection(&self) -> Result<()> {
        let endpoint = join_url(&self.base_url, "api/tags");
        let response = self.client.get(&endpoint).send().await.map_err(|e| {
            translation_error!(config, "base_url", format!("Ollama服务不可达 ({}): {}", endpoint, e))
        })?;
        let response = ensure_success(response, &endpoint).await.map_err(|e| {
            translation_error!(config, "base_url", format!("Ollama服务异常: {}", e))
        })?;
        let tags: TagsResponse = response.json().await?;

        if tags.has_model(&self.model) {
            info!("✓ 已连接Ollama (模型: {})", self.model);
        } else {
            let available: Vec<&str> = tags.models.iter().map(|tag| tag.name.as_str()).collect();
            warn!(
                "⚠️  未找到模型 {}，可用模型: {}。请执行: ollama pull {}",
                self.model,
                available.join(", "),
                self.model
            );
        }
        Ok(())
    }
}
