//! 音色指令解析
//!
//! 输入文本可以携带音色选择前缀：
//! - `VOICE:TRAINED|gpt|sovits|ref_audio|prompt_text|lang|text`
//! - `VOICE:CUSTOM|ref_audio|prompt_text|lang|text`
//! - `VOICE:name|text`
//!
//! 格式错误不会中断处理：记录警告后整段文本按默认音色合成。

use serde_json::Value;
use thiserror::Error;

use super::voice::{coerce_directive_language, VoiceError};

pub const VOICE_PREFIX: &str = "VOICE:";
pub const VOICE_CUSTOM_PREFIX: &str = "VOICE:CUSTOM|";
pub const VOICE_TRAINED_PREFIX: &str = "VOICE:TRAINED|";

const TRAINED_PARTS: usize = 6;
const CUSTOM_PARTS: usize = 4;

/// 解析得到的音色选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceDirective {
    /// 使用节点配置的默认音色
    Default,
    /// 注册表中的内置音色
    Named(String),
    /// 零样本克隆
    Custom {
        ref_audio: String,
        prompt_text: String,
        lang: String,
    },
    /// 训练得到的模型权重
    Trained {
        gpt_weights: String,
        sovits_weights: String,
        ref_audio: String,
        prompt_text: String,
        lang: String,
    },
}

/// 指令解析警告（非致命）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("Invalid {variant} voice format (expected {expected} parts), got {actual}")]
    Arity {
        variant: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid VOICE: format (expected 'VOICE:name|text')")]
    MissingSeparator,

    #[error(transparent)]
    Voice(#[from] VoiceError),
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPayload {
    pub directive: VoiceDirective,
    pub text: String,
    pub warnings: Vec<DirectiveError>,
}

impl ParsedPayload {
    fn plain(text: &str) -> Self {
        Self {
            directive: VoiceDirective::Default,
            text: text.to_string(),
            warnings: Vec::new(),
        }
    }

    fn fallback(text: &str, warning: DirectiveError) -> Self {
        Self {
            directive: VoiceDirective::Default,
            text: text.to_string(),
            warnings: vec![warning],
        }
    }
}

/// 从原始负载中取出 prompt
///
/// 负载为 `{"prompt": "..."}` 时取 prompt 字段，否则整个负载即为 prompt
pub fn extract_prompt(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => match map.get("prompt") {
            Some(Value::String(prompt)) => prompt.clone(),
            _ => raw.to_string(),
        },
        _ => raw.to_string(),
    }
}

/// 解析原始负载（JSON 信封 + 音色指令）
pub fn parse_payload(
    raw: &str,
    is_known_voice: impl Fn(&str) -> bool,
    default_voice: &str,
) -> ParsedPayload {
    let prompt = extract_prompt(raw);
    let parsed = parse_directive(&prompt, is_known_voice, default_voice);
    for warning in &parsed.warnings {
        tracing::warn!(prompt = %truncate(&prompt, 100), "{}", warning);
    }
    parsed
}

/// 解析音色指令，按 TRAINED → CUSTOM → 内置 → 纯文本 的顺序匹配
pub fn parse_directive(
    prompt: &str,
    is_known_voice: impl Fn(&str) -> bool,
    default_voice: &str,
) -> ParsedPayload {
    if let Some(rest) = prompt.strip_prefix(VOICE_TRAINED_PREFIX) {
        let parts: Vec<&str> = rest.splitn(TRAINED_PARTS, '|').collect();
        if parts.len() != TRAINED_PARTS {
            return ParsedPayload::fallback(
                prompt,
                DirectiveError::Arity {
                    variant: "TRAINED",
                    expected: TRAINED_PARTS,
                    actual: parts.len(),
                },
            );
        }
        return ParsedPayload {
            directive: VoiceDirective::Trained {
                gpt_weights: parts[0].to_string(),
                sovits_weights: parts[1].to_string(),
                ref_audio: parts[2].to_string(),
                prompt_text: parts[3].to_string(),
                lang: coerce_directive_language(parts[4]),
            },
            text: parts[5].to_string(),
            warnings: Vec::new(),
        };
    }

    if let Some(rest) = prompt.strip_prefix(VOICE_CUSTOM_PREFIX) {
        let parts: Vec<&str> = rest.splitn(CUSTOM_PARTS, '|').collect();
        if parts.len() != CUSTOM_PARTS {
            return ParsedPayload::fallback(
                prompt,
                DirectiveError::Arity {
                    variant: "CUSTOM",
                    expected: CUSTOM_PARTS,
                    actual: parts.len(),
                },
            );
        }
        return ParsedPayload {
            directive: VoiceDirective::Custom {
                ref_audio: parts[0].to_string(),
                prompt_text: parts[1].to_string(),
                lang: coerce_directive_language(parts[2]),
            },
            text: parts[3].to_string(),
            warnings: Vec::new(),
        };
    }

    if let Some(rest) = prompt.strip_prefix(VOICE_PREFIX) {
        let Some((name, text)) = rest.split_once('|') else {
            return ParsedPayload::fallback(prompt, DirectiveError::MissingSeparator);
        };
        let name = name.trim();
        if is_known_voice(name) {
            return ParsedPayload {
                directive: VoiceDirective::Named(name.to_string()),
                text: text.to_string(),
                warnings: Vec::new(),
            };
        }
        return ParsedPayload {
            directive: VoiceDirective::Named(default_voice.to_string()),
            text: text.to_string(),
            warnings: vec![DirectiveError::Voice(VoiceError::UnknownVoice {
                name: name.to_string(),
                fallback: default_voice.to_string(),
            })],
        };
    }

    ParsedPayload::plain(prompt)
}

/// 按字符截断（用于日志）
pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
