//! FB2 Translator - FB2电子书俄语→塞尔维亚语翻译工具库
//!
//! 这个库提供了FB2文档解析与序列化、元素树遍历翻译、多种LLM翻译后端、
//! 拉丁字母转写和代码库哈希校验等核心功能。

pub mod api_constants;
pub mod config;
pub mod document;
pub mod error;
pub mod fb2;
pub mod hasher;
pub mod providers;
pub mod stats;
pub mod translator;
pub mod transliterate;
pub mod utils;
pub mod walker;

pub use error::{Result, TranslationError};
pub use translator::{build_translator, Provider, Translate};
pub use walker::{TranslationSession, WalkStats};
