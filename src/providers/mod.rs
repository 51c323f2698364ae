//! 翻译后端实现
//!
//! - openai_compat: OpenAI / DeepSeek / 智谱AI（OpenAI兼容的 chat/completions 接口）
//! - anthropic: Anthropic Messages 接口
//! - ollama: 本地 Ollama 服务
//! - dictionary: 内置词典的朴素逐词替换，无需网络

// 标准库导入
use std::time::Duration;

// 第三方crate导入
use reqwest::{Client, Response};
use tracing::error;

// 本地模块导入
use crate::config::TranslatorConfig;
use crate::error::Result;
use crate::translation_error;

pub mod anthropic;
pub mod dictionary;
pub mod ollama;
pub mod openai_compat;

/// 创建带超时的HTTP客户端
pub(crate) fn build_http_client(config: &TranslatorConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs()))
        .build()
        .map_err(|e| translation_error!(config, "http_client", format!("创建HTTP客户端失败: {}", e)))
}

/// 检查响应状态，失败时读取错误正文
pub(crate) async fn ensure_success(response: Response, api_url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "无法读取错误响应".to_string());
    error!("❌ 翻译API返回错误状态 [{}]: {}", status, body);
    Err(translation_error!(translation_api, status.as_u16(), body, api_url))
}

/// 拼接基础地址和接口路径
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
