//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

/// 音色来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceSource {
    /// 注册表中的内置音色
    Builtin,
    /// 零样本克隆（仅参考音频）
    Custom,
    /// 少样本训练得到的模型权重
    Trained,
}

impl VoiceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Custom => "custom",
            Self::Trained => "trained",
        }
    }
}

/// 音色身份
///
/// 引擎是否需要重建只取决于身份是否变化。
/// Custom / Trained 的 name 由所有影响引擎构建的指令字段拼接而成。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceIdentity {
    source: VoiceSource,
    name: String,
}

impl VoiceIdentity {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            source: VoiceSource::Builtin,
            name: name.into(),
        }
    }

    pub fn custom(ref_audio: &str, prompt_text: &str, lang: &str) -> Self {
        Self {
            source: VoiceSource::Custom,
            name: [ref_audio, prompt_text, lang].join("|"),
        }
    }

    pub fn trained(
        gpt_weights: &str,
        sovits_weights: &str,
        ref_audio: &str,
        prompt_text: &str,
        lang: &str,
    ) -> Self {
        Self {
            source: VoiceSource::Trained,
            name: [gpt_weights, sovits_weights, ref_audio, prompt_text, lang].join("|"),
        }
    }

    pub fn source(&self) -> VoiceSource {
        self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 引擎侧使用的音色名：内置音色转小写并去掉空格，其余使用来源名
    pub fn engine_voice_name(&self) -> String {
        match self.source {
            VoiceSource::Builtin => self.name.to_lowercase().replace(' ', ""),
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for VoiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source.as_str(), self.name)
    }
}

/// 音色配置
///
/// 所有字段均可缺省，合并时按字段粒度补齐
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// 模型仓库（相对路径的权重文件以此为根）
    pub repository: Option<String>,
    pub gpt_weights: Option<String>,
    pub sovits_weights: Option<String>,
    pub reference_audio: Option<String>,
    pub prompt_text: Option<String>,
    pub text_lang: Option<String>,
    pub prompt_lang: Option<String>,
    pub speed_factor: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub temperature: Option<f32>,
    pub batch_size: Option<u32>,
    pub seed: Option<i64>,
    pub text_split_method: Option<String>,
    pub split_bucket: Option<bool>,
    /// 是否流式返回片段
    pub return_fragment: Option<bool>,
    pub use_gpu: Option<bool>,
    pub device: Option<String>,
    pub sample_rate: Option<u32>,
    /// 片段间静音间隔（秒）
    pub fragment_interval: Option<f32>,
}

macro_rules! merge_fields {
    (fill $target:expr, $source:expr; $($field:ident),+ $(,)?) => {
        $(
            if $target.$field.is_none() {
                $target.$field = $source.$field.clone();
            }
        )+
    };
    (override $target:expr, $source:expr; $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field.clone();
            }
        )+
    };
}

impl VoiceConfig {
    /// 仅补齐本配置中缺失的字段
    pub fn fill_missing(&mut self, defaults: &VoiceConfig) {
        merge_fields!(fill self, defaults;
            repository, gpt_weights, sovits_weights, reference_audio, prompt_text,
            text_lang, prompt_lang, speed_factor, top_k, top_p, temperature, batch_size,
            seed, text_split_method, split_bucket, return_fragment, use_gpu, device,
            sample_rate, fragment_interval,
        );
    }

    /// 用 `overrides` 中已设置的字段覆盖本配置
    pub fn apply_overrides(&mut self, overrides: &VoiceConfig) {
        merge_fields!(override self, overrides;
            repository, gpt_weights, sovits_weights, reference_audio, prompt_text,
            text_lang, prompt_lang, speed_factor, top_k, top_p, temperature, batch_size,
            seed, text_split_method, split_bucket, return_fragment, use_gpu, device,
            sample_rate, fragment_interval,
        );
    }

    pub fn text_lang(&self) -> &str {
        self.text_lang.as_deref().unwrap_or("zh")
    }

    pub fn prompt_lang(&self) -> &str {
        self.prompt_lang.as_deref().unwrap_or("auto")
    }

    pub fn speed_factor(&self) -> f32 {
        self.speed_factor.unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_voice_name() {
        assert_eq!(VoiceIdentity::builtin("Luo Xiang").engine_voice_name(), "luoxiang");
        assert_eq!(
            VoiceIdentity::custom("/tmp/a.wav", "hi", "en").engine_voice_name(),
            "custom"
        );
    }

    #[test]
    fn test_custom_identities_differ_by_reference() {
        let a = VoiceIdentity::custom("/tmp/a.wav", "hi", "en");
        let b = VoiceIdentity::custom("/tmp/b.wav", "hi", "en");
        assert_ne!(a, b);
        assert_eq!(a, VoiceIdentity::custom("/tmp/a.wav", "hi", "en"));
    }

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut config = VoiceConfig {
            speed_factor: Some(1.1),
            ..Default::default()
        };
        let defaults = VoiceConfig {
            speed_factor: Some(1.0),
            top_k: Some(5),
            ..Default::default()
        };
        config.fill_missing(&defaults);
        assert_eq!(config.speed_factor, Some(1.1));
        assert_eq!(config.top_k, Some(5));
    }

    #[test]
    fn test_apply_overrides_replaces_set_fields() {
        let mut config = VoiceConfig {
            text_lang: Some("zh".into()),
            top_k: Some(5),
            ..Default::default()
        };
        let overrides = VoiceConfig {
            text_lang: Some("en".into()),
            ..Default::default()
        };
        config.apply_overrides(&overrides);
        assert_eq!(config.text_lang(), "en");
        assert_eq!(config.top_k, Some(5));
    }

    #[test]
    fn test_accessor_defaults() {
        let config = VoiceConfig::default();
        assert_eq!(config.text_lang(), "zh");
        assert_eq!(config.prompt_lang(), "auto");
        assert_eq!(config.speed_factor(), 1.0);
    }
}
