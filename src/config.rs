//! 配置管理模块
//!
//! 提供CLI参数解析、翻译后端配置和JSON配置文件读写功能

// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// 本地模块导入
use crate::api_constants::{env_keys, is_valid_api_url, service_config};
use crate::error::Result;
use crate::translation_error;
use crate::translator::Provider;

/// 翻译后端配置结构体
///
/// 支持Builder模式进行链式配置，也可以从JSON配置文件加载。
///
/// # Examples
///
/// ```rust
/// use fb2_translator::config::TranslatorConfig;
/// use fb2_translator::translator::Provider;
///
/// let config = TranslatorConfig::new(Provider::DeepSeek)
///     .with_api_key("sk-...")
///     .with_temperature(0.2)
///     .with_max_tokens(Some(2000));
/// assert_eq!(config.model(), "deepseek-chat");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// 翻译后端
    provider: Provider,
    /// 模型名称
    model: String,
    /// API密钥
    #[serde(default)]
    api_key: Option<String>,
    /// 自定义API地址
    #[serde(default)]
    base_url: Option<String>,
    /// 采样温度 [0, 1]
    #[serde(default = "default_temperature")]
    temperature: f32,
    /// 最大输出token数
    #[serde(default)]
    max_tokens: Option<u32>,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_temperature() -> f32 {
    service_config::DEFAULT_TEMPERATURE
}

fn default_timeout_secs() -> u64 {
    service_config::REQUEST_TIMEOUT_SECONDS
}

impl TranslatorConfig {
    /// 创建新的配置实例，模型使用该后端的默认模型
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// 设置模型名称
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// 设置API密钥
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// 设置自定义API地址
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// 设置采样温度
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// 设置最大输出token数
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// 设置请求超时时间
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// 未设置API密钥时，从后端专用环境变量中读取
    pub fn resolve_api_key_from_env(mut self) -> Self {
        if self.api_key.is_none() {
            if let Some(var) = provider_env_key(self.provider) {
                if let Some(value) = non_empty_env(var) {
                    debug!("🔑 从环境变量 {} 读取API密钥", var);
                    self.api_key = Some(value);
                }
            }
        }
        self
    }

    /// 校验配置
    ///
    /// 配置无效时返回配置错误，例如非本地后端缺少API密钥。
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(translation_error!(config, "model", "模型名称不能为空"));
        }

        if !self.provider.is_local() && self.api_key().map_or(true, |key| key.trim().is_empty()) {
            return Err(translation_error!(
                config,
                "api_key",
                format!("{} 需要API密钥（--api-key 或环境变量）", self.provider)
            ));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(translation_error!(
                config,
                "temperature",
                format!("温度必须在 [0, 1] 范围内: {}", self.temperature)
            ));
        }

        if let Some(url) = self.base_url() {
            if !is_valid_api_url(url) {
                return Err(translation_error!(config, "base_url", format!("无效的API地址: {}", url)));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(translation_error!(config, "max_tokens", "最大输出token数必须大于0"));
        }

        Ok(())
    }

    /// 从JSON配置文件加载
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| translation_error!(file_op, path.display(), "读取", e))?;
        let config: TranslatorConfig = serde_json::from_str(&content).map_err(|e| {
            translation_error!(config, path.display(), format!("配置文件格式错误: {}", e))
        })?;
        debug!("📋 已加载配置文件: {}", path.display());
        Ok(config)
    }

    /// 写出默认配置模板
    pub fn save_default(path: &Path) -> Result<()> {
        let template = TranslatorConfig::new(Provider::OpenAi)
            .with_api_key("your-api-key-here")
            .with_max_tokens(Some(service_config::DEFAULT_MAX_TOKENS));
        let content = serde_json::to_string_pretty(&template)
            .map_err(|e| translation_error!(config, "template", e))?;
        std::fs::write(path, content)
            .map_err(|e| translation_error!(file_op, path.display(), "写入", e))?;
        info!("📝 默认配置已保存到 {}，请填写API密钥", path.display());
        Ok(())
    }
}

/// 后端专用的API密钥环境变量
pub fn provider_env_key(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::OpenAi => Some(env_keys::OPENAI_API_KEY),
        Provider::Anthropic => Some(env_keys::ANTHROPIC_API_KEY),
        Provider::DeepSeek => Some(env_keys::DEEPSEEK_API_KEY),
        Provider::Zhipu => Some(env_keys::ZHIPU_API_KEY),
        Provider::Ollama | Provider::Dictionary => None,
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// CLI参数结构
#[derive(Parser, Debug)]
#[command(author, version, about = "FB2电子书俄语→塞尔维亚语翻译工具 - 支持多种LLM后端和内置词典", long_about = None)]
pub struct Cli {
    /// 输入FB2文件路径
    #[arg(value_name = "FILE", required_unless_present = "create_config")]
    pub input: Option<PathBuf>,

    /// 输出文件路径 (可选，默认为输入文件名+_sr_llm.fb2)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 翻译后端
    #[arg(short, long, value_enum, env = "LLM_PROVIDER", default_value = "openai")]
    pub provider: Provider,

    /// 模型名称 (默认使用后端的推荐模型)
    #[arg(short, long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// API密钥
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// 自定义API地址
    #[arg(long, env = "LLM_BASE_URL")]
    pub base_url: Option<String>,

    /// 采样温度 [0, 1]
    #[arg(long, env = "LLM_TEMPERATURE", default_value_t = service_config::DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// 最大输出token数
    #[arg(long, env = "LLM_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    /// 请求超时时间（秒）
    #[arg(long, default_value_t = service_config::REQUEST_TIMEOUT_SECONDS)]
    pub timeout: u64,

    /// JSON配置文件 (优先于命令行后端参数)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// 生成默认配置模板后退出
    #[arg(long, value_name = "CONFIG_FILE")]
    pub create_config: Option<PathBuf>,

    /// 输出塞尔维亚语拉丁字母
    #[arg(long)]
    pub latin: bool,

    /// 输出缩进空格数 (0 表示紧凑输出)
    #[arg(long, default_value_t = service_config::DEFAULT_INDENT)]
    pub indent: usize,

    /// 禁用缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 只列出待翻译片段，不调用翻译后端
    #[arg(long)]
    pub dry_run: bool,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,

    /// 显示性能统计
    #[arg(long)]
    pub stats: bool,
}

impl Cli {
    /// 根据命令行参数和配置文件生成翻译后端配置
    pub fn translator_config(&self) -> Result<TranslatorConfig> {
        let config = match &self.config {
            Some(path) => TranslatorConfig::from_file(path)?,
            None => {
                let model = self
                    .model
                    .clone()
                    .unwrap_or_else(|| self.provider.default_model().to_string());
                let mut config = TranslatorConfig::new(self.provider)
                    .with_model(model)
                    .with_base_url(self.base_url.clone())
                    .with_temperature(self.temperature)
                    .with_max_tokens(self.max_tokens)
                    .with_timeout_secs(self.timeout);
                if let Some(key) = self.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
                    config = config.with_api_key(key);
                }
                config
            }
        };

        let config = config.resolve_api_key_from_env();
        config.validate()?;
        Ok(config)
    }

    /// 输出缩进设置
    pub fn indent(&self) -> Option<usize> {
        (self.indent > 0).then_some(self.indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslationError;

    #[test]
    fn test_defaults_per_provider() {
        let config = TranslatorConfig::new(Provider::Anthropic);
        assert_eq!(config.model(), "claude-3-sonnet-20240229");
        assert_eq!(config.temperature(), 0.3);
        assert_eq!(config.max_tokens(), None);
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let err = TranslatorConfig::new(Provider::Zhipu).validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, TranslationError::Config { ref field, .. } if field == "api_key"));

        // 本地后端无需密钥
        assert!(TranslatorConfig::new(Provider::Ollama).validate().is_ok());
        assert!(TranslatorConfig::new(Provider::Dictionary).validate().is_ok());
    }

    #[test]
    fn test_temperature_range() {
        let config = TranslatorConfig::new(Provider::Dictionary);
        assert!(config.clone().with_temperature(0.0).validate().is_ok());
        assert!(config.clone().with_temperature(1.0).validate().is_ok());
        assert!(config.clone().with_temperature(1.5).validate().is_err());
        assert!(config.with_temperature(-0.1).validate().is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let config = TranslatorConfig::new(Provider::Ollama)
            .with_base_url(Some("localhost:11434".to_string()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        TranslatorConfig::save_default(&path).unwrap();

        let loaded = TranslatorConfig::from_file(&path).unwrap();
        assert_eq!(loaded.provider(), Provider::OpenAi);
        assert_eq!(loaded.model(), "gpt-4");
        assert_eq!(loaded.api_key(), Some("your-api-key-here"));
        assert_eq!(loaded.max_tokens(), Some(4000));
    }

    #[test]
    fn test_config_file_with_optional_fields_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"provider":"ollama","model":"qwen2:7b"}"#).unwrap();

        let loaded = TranslatorConfig::from_file(&path).unwrap();
        assert_eq!(loaded.provider(), Provider::Ollama);
        assert_eq!(loaded.temperature(), 0.3);
        assert_eq!(loaded.base_url(), None);
    }

    #[test]
    fn test_cli_builds_dictionary_config() {
        let cli = Cli::try_parse_from(["fb2-translator", "book.fb2", "--provider", "dictionary", "--indent", "0"])
            .unwrap();
        let config = cli.translator_config().unwrap();
        assert_eq!(config.provider(), Provider::Dictionary);
        assert_eq!(config.model(), "builtin");
        assert_eq!(cli.indent(), None);
    }

    // 每个测试只改动各自后端的环境变量，并行运行时互不干扰
    #[test]
    fn test_provider_env_key_fills_missing_credential() {
        std::env::set_var(env_keys::DEEPSEEK_API_KEY, "sk-from-env");

        let resolved = TranslatorConfig::new(Provider::DeepSeek).resolve_api_key_from_env();
        assert_eq!(resolved.api_key(), Some("sk-from-env"));
        assert!(resolved.validate().is_ok());

        let explicit = TranslatorConfig::new(Provider::DeepSeek)
            .with_api_key("sk-explicit")
            .resolve_api_key_from_env();
        assert_eq!(explicit.api_key(), Some("sk-explicit"));

        // 配置文件没有密钥时同样回退到环境变量
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"provider":"deepseek","model":"deepseek-chat"}"#).unwrap();
        let cli = Cli::try_parse_from([
            "fb2-translator",
            "book.fb2",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(cli.translator_config().unwrap().api_key(), Some("sk-from-env"));

        std::env::remove_var(env_keys::DEEPSEEK_API_KEY);
        let missing = TranslatorConfig::new(Provider::DeepSeek).resolve_api_key_from_env();
        assert_eq!(missing.api_key(), None);
    }

    #[test]
    fn test_cli_api_key_wins_over_provider_env() {
        std::env::set_var(env_keys::ANTHROPIC_API_KEY, "sk-ant-env");

        let cli = Cli::try_parse_from([
            "fb2-translator",
            "book.fb2",
            "--provider",
            "anthropic",
            "--api-key",
            "sk-ant-cli",
        ])
        .unwrap();
        assert_eq!(cli.translator_config().unwrap().api_key(), Some("sk-ant-cli"));

        let cli = Cli::try_parse_from(["fb2-translator", "book.fb2", "--provider", "anthropic"]).unwrap();
        assert_eq!(cli.translator_config().unwrap().api_key(), Some("sk-ant-env"));

        // 空白的环境变量等同于未设置
        std::env::set_var(env_keys::ANTHROPIC_API_KEY, "   ");
        let err = cli.translator_config().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, TranslationError::Config { ref field, .. } if field == "api_key"));

        std::env::remove_var(env_keys::ANTHROPIC_API_KEY);
    }

    #[test]
    fn test_cli_requires_input_unless_creating_config() {
        assert!(Cli::try_parse_from(["fb2-translator", "--provider", "dictionary"]).is_err());
        assert!(Cli::try_parse_from(["fb2-translator", "--create-config", "cfg.json"]).is_ok());
    }
}
