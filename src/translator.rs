//! 翻译后端抽象
//!
//! 定义遍历器依赖的唯一能力 [`Translate`]，以及根据配置构建具体后端的工厂函数。
//! 重试、限流、后端选择都属于后端自身，遍历器只关心成功或失败。

// 标准库导入
use std::fmt;
use std::str::FromStr;

// 第三方crate导入
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// 本地模块导入
use crate::api_constants::{model_config, prompt_config};
use crate::config::TranslatorConfig;
use crate::error::{Result, TranslationError};
use crate::providers::anthropic::AnthropicTranslator;
use crate::providers::dictionary::DictionaryTranslator;
use crate::providers::ollama::OllamaTranslator;
use crate::providers::openai_compat::OpenAiCompatTranslator;
use crate::translation_error;

/// 翻译能力
///
/// 对遍历器而言调用是同步的：每个文本片段都会等待结果后再处理下一个。
#[async_trait]
pub trait Translate: Send + Sync {
    /// 后端名称，用于日志和错误信息
    fn name(&self) -> &str;

    /// 翻译单个文本片段
    ///
    /// `context` 是祖先标签路径，只作为风格提示传给后端，不会被解析。
    async fn attempt_translate(&self, text: &str, context: &str) -> Result<String>;

    /// 检查后端是否可用（默认直接通过）
    async fn check_connection(&self) -> Result<()> {
        Ok(())
    }
}

/// 支持的翻译后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
    #[value(name = "deepseek")]
    DeepSeek,
    Zhipu,
    Ollama,
    Dictionary,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::DeepSeek,
        Provider::Zhipu,
        Provider::Ollama,
        Provider::Dictionary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::DeepSeek => "deepseek",
            Provider::Zhipu => "zhipu",
            Provider::Ollama => "ollama",
            Provider::Dictionary => "dictionary",
        }
    }

    /// 本地后端不需要API密钥
    pub fn is_local(&self) -> bool {
        matches!(self, Provider::Ollama | Provider::Dictionary)
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => model_config::OPENAI_DEFAULT_MODEL,
            Provider::Anthropic => model_config::ANTHROPIC_DEFAULT_MODEL,
            Provider::DeepSeek => model_config::DEEPSEEK_DEFAULT_MODEL,
            Provider::Zhipu => model_config::ZHIPU_DEFAULT_MODEL,
            Provider::Ollama => model_config::OLLAMA_DEFAULT_MODEL,
            Provider::Dictionary => model_config::DICTIONARY_MODEL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|provider| provider.as_str() == normalized)
            .ok_or_else(|| translation_error!(config, "provider", format!("不支持的翻译后端: {}", s)))
    }
}

/// 根据配置构建翻译后端
///
/// 配置会先经过校验，缺少密钥等问题在处理文档之前就会报错。
pub fn build_translator(config: &TranslatorConfig) -> Result<Box<dyn Translate>> {
    config.validate()?;

    let translator: Box<dyn Translate> = match config.provider() {
        Provider::OpenAi | Provider::DeepSeek | Provider::Zhipu => {
            Box::new(OpenAiCompatTranslator::new(config)?)
        }
        Provider::Anthropic => Box::new(AnthropicTranslator::new(config)?),
        Provider::Ollama => Box::new(OllamaTranslator::new(config)?),
        Provider::Dictionary => Box::new(DictionaryTranslator::new()),
    };

    Ok(translator)
}

/// 构建文学翻译提示词
pub fn create_translation_prompt(text: &str, context: &str) -> String {
    let context = if context.is_empty() {
        prompt_config::DEFAULT_CONTEXT
    } else {
        context
    };

    format!(
        "You are a professional literary translator specializing in Russian to Serbian translation. \n\
Your task is to translate the following Russian text into natural, idiomatic Serbian.

Guidelines:
1. Preserve the literary style and tone
2. Use appropriate Serbian vocabulary and grammar
3. Maintain cultural nuances and idioms
4. Keep names of people and places unchanged unless they have standard Serbian equivalents
5. Preserve formatting, punctuation, and paragraph structure
6. Use Serbian Cyrillic script (ћирилица)

Context: {context}

Russian text:
{text}

Serbian translation:"
    )
}

/// 模型输出后处理
///
/// - 去掉模型输出首尾空白，再恢复原文首尾的空白，保证排版不被改变
/// - 原文首字母大写而译文小写时，修正为大写
pub fn enhance_translation(original: &str, translated: &str) -> String {
    let core = translated.trim();
    if core.is_empty() {
        return String::new();
    }

    let mut core = core.to_string();
    let original_core = original.trim_start();
    let starts_upper = original_core.chars().next().is_some_and(char::is_uppercase);
    if starts_upper {
        if let Some(first) = core.chars().next().filter(|c| c.is_lowercase()) {
            let rest = &core[first.len_utf8()..];
            core = first.to_uppercase().chain(rest.chars()).collect();
        }
    }

    let leading_len = original.len() - original.trim_start().len();
    let trailing_start = original.trim_end().len();
    let leading = &original[..leading_len];
    let trailing = if trailing_start >= leading_len {
        &original[trailing_start..]
    } else {
        ""
    };

    format!("{}{}{}", leading, core, trailing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!(" DeepSeek ".parse::<Provider>().unwrap(), Provider::DeepSeek);
        assert!("google".parse::<Provider>().is_err());
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
    }

    #[test]
    fn test_provider_serde_names() {
        let json = serde_json::to_string(&Provider::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: Provider = serde_json::from_str("\"zhipu\"").unwrap();
        assert_eq!(parsed, Provider::Zhipu);
    }

    #[test]
    fn test_local_providers() {
        assert!(Provider::Ollama.is_local());
        assert!(Provider::Dictionary.is_local());
        assert!(!Provider::Anthropic.is_local());
    }

    #[test]
    fn test_prompt_contains_text_and_context() {
        let prompt = create_translation_prompt("Привет", "FictionBook/body/p");
        assert!(prompt.contains("Context: FictionBook/body/p"));
        assert!(prompt.ends_with("Привет\n\nSerbian translation:"));

        let prompt = create_translation_prompt("Привет", "");
        assert!(prompt.contains("Context: Literary text"));
    }

    #[test]
    fn test_enhance_restores_padding() {
        assert_eq!(enhance_translation("\n  Привет мир\n", "Здраво свете"), "\n  Здраво свете\n");
        assert_eq!(enhance_translation("Привет", "  здраво \n"), "Здраво");
        assert_eq!(enhance_translation("привет", "здраво"), "здраво");
    }

    #[test]
    fn test_enhance_empty_output() {
        assert_eq!(enhance_translation("Привет", "   "), "");
    }
}
