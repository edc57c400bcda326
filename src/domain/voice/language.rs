//! 语言代码校验
//!
//! 合成引擎只接受固定的语言代码集合。非法代码不会被拦截，
//! 而是记录错误并原样透传，由引擎在合成时报错。

use super::VoiceError;

/// 引擎支持的语言代码
pub const VALID_LANGUAGES: &[&str] = &[
    "auto", "auto_yue", "en", "zh", "ja", "yue", "ko", "all_zh", "all_ja", "all_yue", "all_ko",
];

/// `VOICE:CUSTOM` / `VOICE:TRAINED` 指令允许的语言代码
pub const DIRECTIVE_LANGUAGES: &[&str] = &["zh", "en", "ja", "auto"];

/// 常见拼写错误的修复建议
fn language_hint(code: &str) -> Option<&'static str> {
    match code.to_lowercase().as_str() {
        "cn" => Some("Did you mean 'zh' for Chinese? Use 'zh' not 'cn'!"),
        "chinese" => Some("Use 'zh' for Chinese, not 'chinese'!"),
        "english" => Some("Use 'en' for English, not 'english'!"),
        _ => None,
    }
}

pub fn is_valid_language(code: &str) -> bool {
    VALID_LANGUAGES.contains(&code)
}

/// 校验语言代码
///
/// `param` 为配置项名称（如 `TEXT_LANG`），用于错误信息
pub fn validate_language(code: &str, param: &'static str) -> Result<(), VoiceError> {
    if is_valid_language(code) {
        return Ok(());
    }
    Err(VoiceError::InvalidLanguage {
        param,
        code: code.to_string(),
        hint: language_hint(code),
    })
}

/// 校验并透传语言代码，非法时输出带提示的错误日志
pub fn checked_language(code: &str, param: &'static str) -> String {
    if let Err(err) = validate_language(code, param) {
        tracing::error!(param, code, "{}", err);
        if let Some(hint) = err.hint() {
            tracing::error!(param, "{}", hint);
        }
        tracing::error!("Valid languages: {}", VALID_LANGUAGES.join(", "));
        tracing::error!("TTS will fail until you fix {}!", param);
    }
    code.to_string()
}

/// 指令中的语言代码只允许 zh/en/ja/auto，其余一律视为 auto
pub fn coerce_directive_language(lang: &str) -> String {
    if DIRECTIVE_LANGUAGES.contains(&lang) {
        lang.to_string()
    } else {
        "auto".to_string()
    }
}
