//! Voice Context - Errors

use thiserror::Error;

/// 音色配置校验错误
///
/// 均为非致命错误：调用方记录日志后使用回退值继续执行
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("Unknown voice '{name}', falling back to '{fallback}'")]
    UnknownVoice { name: String, fallback: String },

    #[error("INVALID {param}: '{code}' is NOT a valid language")]
    InvalidLanguage {
        param: &'static str,
        code: String,
        hint: Option<&'static str>,
    },
}

impl VoiceError {
    /// 修复建议（仅语言错误可能提供）
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidLanguage { hint, .. } => *hint,
            Self::UnknownVoice { .. } => None,
        }
    }
}
