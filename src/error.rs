//! 错误类型
//!
//! 按处理方式分为两类：
//! - 致命错误（配置、文档解析、序列化、文件读写）：在写出任何结果之前中止整个运行
//! - 片段错误（HTTP、API状态、空译文）：只影响当前文本片段，由遍历器保留原文后继续

// 标准库导入
use std::fmt;

/// FB2翻译错误
#[derive(Debug)]
pub enum TranslationError {
    /// 请求未能完成（连接、超时、响应体解码）
    Http {
        message: String,
        status: Option<u16>,
    },

    /// 后端返回了非2xx状态
    Api {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// 后端返回成功但译文为空
    EmptyResult { provider: String },

    /// 文档不是良构XML，或编码无法识别
    Xml {
        details: String,
        /// 字节偏移
        position: Option<u64>,
    },

    /// 元素树无法写回XML
    Serialize { details: String },

    /// 文件读写失败
    Io {
        path: String,
        action: String,
        message: String,
    },

    /// 后端配置无效（缺少密钥、非法地址、参数越界）
    Config { field: String, reason: String },

    /// 其他内部错误
    Other(anyhow::Error),
}

impl TranslationError {
    /// 是否为致命错误（需要在处理文档前中止）
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TranslationError::Http { .. }
                | TranslationError::Api { .. }
                | TranslationError::EmptyResult { .. }
        )
    }

    /// HTTP状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            TranslationError::Http { status, .. } => *status,
            TranslationError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::Http { message, status: Some(status) } => {
                write!(f, "HTTP请求出错 (状态 {}): {}", status, message)
            }
            TranslationError::Http { message, status: None } => {
                write!(f, "HTTP请求出错: {}", message)
            }
            TranslationError::Api { status, endpoint, body } => {
                write!(f, "{} 返回状态 {}: {}", endpoint, status, body)
            }
            TranslationError::EmptyResult { provider } => {
                write!(f, "{} 没有返回译文", provider)
            }
            TranslationError::Xml { details, position: Some(position) } => {
                write!(f, "XML解析失败 (字节 {}): {}", position, details)
            }
            TranslationError::Xml { details, position: None } => {
                write!(f, "XML解析失败: {}", details)
            }
            TranslationError::Serialize { details } => write!(f, "XML输出失败: {}", details),
            TranslationError::Io { path, action, message } => {
                write!(f, "无法{}文件 {}: {}", action, path, message)
            }
            TranslationError::Config { field, reason } => {
                write!(f, "配置项 {} 无效: {}", field, reason)
            }
            TranslationError::Other(source) => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for TranslationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslationError::Other(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslationError>;

/// 快速构造 [`TranslationError`]
#[macro_export]
macro_rules! translation_error {
    (xml_parse, $details:expr) => {
        $crate::error::TranslationError::Xml {
            details: $details.to_string(),
            position: None,
        }
    };
    (xml_parse, $details:expr, $pos:expr) => {
        $crate::error::TranslationError::Xml {
            details: $details.to_string(),
            position: Some($pos),
        }
    };
    (serialization, $details:expr) => {
        $crate::error::TranslationError::Serialize {
            details: $details.to_string(),
        }
    };
    (file_op, $path:expr, $action:expr, $err:expr) => {
        $crate::error::TranslationError::Io {
            path: $path.to_string(),
            action: $action.to_string(),
            message: $err.to_string(),
        }
    };
    (translation_api, $status:expr, $body:expr, $endpoint:expr) => {
        $crate::error::TranslationError::Api {
            status: $status,
            endpoint: $endpoint.to_string(),
            body: $body.to_string(),
        }
    };
    (empty, $provider:expr) => {
        $crate::error::TranslationError::EmptyResult {
            provider: $provider.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::TranslationError::Config {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}

impl From<anyhow::Error> for TranslationError {
    fn from(error: anyhow::Error) -> Self {
        TranslationError::Other(error)
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        TranslationError::Http {
            status: error.status().map(|status| status.as_u16()),
            message: error.to_string(),
        }
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        translation_error!(file_op, "-", "访问", error)
    }
}

impl From<quick_xml::Error> for TranslationError {
    fn from(error: quick_xml::Error) -> Self {
        translation_error!(xml_parse, error)
    }
}
