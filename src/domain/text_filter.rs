//! 文本过滤
//!
//! 判断片段是否需要合成：只剩标点或空白的片段直接跳过

/// 检查字符是否属于可跳过集合（标点、引号、括号、空白）
#[inline]
fn is_skippable_char(ch: char) -> bool {
    matches!(
        ch,
        '。' | '！' | '？' | '.' | '!' | '?' | ',' | '，' | '、' | '；' | '：'
            // 中英文引号: " ' \u{201C} \u{201D} \u{2018} \u{2019}（含 ASCII 单引号）
            | '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}'
            | '（' | '）' | '【' | '】' | '《' | '》'
            | '\n' | '\r' | '\t' | ' '
    )
}

/// 片段去掉首尾空白后为空，或仅由可跳过字符组成
pub fn is_punctuation_only(text: &str) -> bool {
    text.trim().chars().all(is_skippable_char)
}
