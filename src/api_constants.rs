/// 翻译后端配置常量
///
/// 该文件定义了所有翻译服务相关的常量配置，方便统一管理和维护

/// 各翻译后端的默认API地址
pub mod api_config {
    /// OpenAI API地址
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

    /// DeepSeek API地址（OpenAI兼容）
    pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

    /// 智谱AI API地址（OpenAI兼容）
    pub const ZHIPU_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

    /// Anthropic API地址
    pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

    /// Anthropic API版本头
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";

    /// 本地Ollama服务地址
    pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
}

/// 默认模型名称
pub mod model_config {
    pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4";
    pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
    pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";
    pub const ZHIPU_DEFAULT_MODEL: &str = "glm-4";
    /// 配置的智谱模型不可用时依次尝试的候选模型
    pub const ZHIPU_FALLBACK_MODELS: &[&str] = &[
        "glm-4",
        "glm-4v",
        "glm-4-0520",
        "glm-4-0206",
        "glm-4-air",
        "glm-4-airx",
        "glm-4-flash",
        "chatglm3",
        "chatglm_pro",
    ];
    pub const OLLAMA_DEFAULT_MODEL: &str = "llama3:8b";
    pub const DICTIONARY_MODEL: &str = "builtin";
}

/// 各后端专用的API密钥环境变量
pub mod env_keys {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
    pub const ZHIPU_API_KEY: &str = "ZHIPU_API_KEY";
}

/// 翻译服务配置
pub mod service_config {
    /// 目标语言代码（写入FB2元数据）
    pub const TARGET_LANGUAGE: &str = "sr";

    /// 默认采样温度
    pub const DEFAULT_TEMPERATURE: f32 = 0.3;

    /// 默认最大输出token数
    pub const DEFAULT_MAX_TOKENS: u32 = 4000;

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 120;

    /// 默认输出缩进（空格数）
    pub const DEFAULT_INDENT: usize = 1;
}

/// 提示词常量
pub mod prompt_config {
    /// OpenAI系统提示词
    pub const OPENAI_SYSTEM_PROMPT: &str =
        "You are a professional Russian to Serbian literary translator.";

    /// DeepSeek系统提示词
    pub const DEEPSEEK_SYSTEM_PROMPT: &str = "You are a professional Russian to Serbian literary translator known for preserving cultural nuances and literary style.";

    /// 智谱AI系统提示词
    pub const ZHIPU_SYSTEM_PROMPT: &str = "You are a professional Russian to Serbian literary translator with deep understanding of cultural nuances and literary style.";

    /// 未提供上下文时使用的默认上下文
    pub const DEFAULT_CONTEXT: &str = "Literary text";
}

/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}
