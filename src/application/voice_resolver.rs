//! Voice Resolver - 音色解析
//!
//! 把音色指令解析为音色身份和合并后的音色配置：
//! - 内置音色：注册表配置 → 节点显式覆盖 → 节点默认值补齐
//! - 克隆/训练音色：指令字段 + 默认权重 → 节点默认值补齐

use std::sync::Arc;

use crate::application::ports::VoiceRegistryPort;
use crate::domain::directive::{parse_payload, ParsedPayload, VoiceDirective};
use crate::domain::voice::{VoiceConfig, VoiceIdentity};

/// 零样本克隆使用的默认模型
pub const CLONE_REPOSITORY: &str = "MoYoYoTech/tone-models";
pub const CLONE_GPT_WEIGHTS: &str = "GPT_weights/doubao-mixed.ckpt";
pub const CLONE_SOVITS_WEIGHTS: &str = "SoVITS_weights/doubao-mixed.pth";
/// 克隆/训练音色的语速
pub const CLONE_SPEED_FACTOR: f32 = 1.1;

/// 音色解析配置
#[derive(Debug, Clone, Default)]
pub struct VoiceResolverConfig {
    /// 默认音色名（必须存在于注册表）
    pub default_voice: String,
    /// 运维显式设置的覆盖项，只作用于内置音色
    pub overrides: VoiceConfig,
    /// 节点级默认值，补齐所有音色缺失的字段
    pub defaults: VoiceConfig,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVoice {
    pub identity: VoiceIdentity,
    pub config: VoiceConfig,
}

pub struct VoiceResolver {
    registry: Arc<dyn VoiceRegistryPort>,
    config: VoiceResolverConfig,
}

impl VoiceResolver {
    pub fn new(registry: Arc<dyn VoiceRegistryPort>, config: VoiceResolverConfig) -> Self {
        Self { registry, config }
    }

    pub fn default_voice(&self) -> &str {
        &self.config.default_voice
    }

    /// 解析原始负载中的音色指令
    pub fn parse(&self, raw: &str) -> ParsedPayload {
        parse_payload(
            raw,
            |name| self.registry.contains(name),
            &self.config.default_voice,
        )
    }

    /// 解析音色指令
    pub fn resolve(&self, directive: &VoiceDirective) -> ResolvedVoice {
        match directive {
            VoiceDirective::Default => self.resolve_builtin(&self.config.default_voice),
            VoiceDirective::Named(name) => self.resolve_builtin(name),
            VoiceDirective::Custom {
                ref_audio,
                prompt_text,
                lang,
            } => {
                let config = VoiceConfig {
                    repository: Some(CLONE_REPOSITORY.to_string()),
                    gpt_weights: Some(CLONE_GPT_WEIGHTS.to_string()),
                    sovits_weights: Some(CLONE_SOVITS_WEIGHTS.to_string()),
                    ..cloned_voice_config(ref_audio, prompt_text, lang)
                };
                tracing::info!(ref_audio = %ref_audio, "Using custom voice");
                ResolvedVoice {
                    identity: VoiceIdentity::custom(ref_audio, prompt_text, lang),
                    config: self.with_defaults(config),
                }
            }
            VoiceDirective::Trained {
                gpt_weights,
                sovits_weights,
                ref_audio,
                prompt_text,
                lang,
            } => {
                let config = VoiceConfig {
                    gpt_weights: Some(gpt_weights.clone()),
                    sovits_weights: Some(sovits_weights.clone()),
                    ..cloned_voice_config(ref_audio, prompt_text, lang)
                };
                tracing::info!(
                    gpt_weights = %gpt_weights,
                    sovits_weights = %sovits_weights,
                    ref_audio = %ref_audio,
                    "Using trained voice with custom models"
                );
                ResolvedVoice {
                    identity: VoiceIdentity::trained(
                        gpt_weights,
                        sovits_weights,
                        ref_audio,
                        prompt_text,
                        lang,
                    ),
                    config: self.with_defaults(config),
                }
            }
        }
    }

    fn resolve_builtin(&self, name: &str) -> ResolvedVoice {
        let (name, mut config) = match self.registry.lookup(name) {
            Some(config) => (name, config),
            None => {
                let fallback = &self.config.default_voice;
                tracing::warn!(
                    voice = %name,
                    fallback = %fallback,
                    "Voice not found, using default"
                );
                (
                    fallback.as_str(),
                    self.registry.lookup(fallback).unwrap_or_default(),
                )
            }
        };
        config.apply_overrides(&self.config.overrides);
        ResolvedVoice {
            identity: VoiceIdentity::builtin(name),
            config: self.with_defaults(config),
        }
    }

    fn with_defaults(&self, mut config: VoiceConfig) -> VoiceConfig {
        config.fill_missing(&self.config.defaults);
        config
    }
}

fn cloned_voice_config(ref_audio: &str, prompt_text: &str, lang: &str) -> VoiceConfig {
    VoiceConfig {
        reference_audio: Some(ref_audio.to_string()),
        prompt_text: Some(prompt_text.to_string()),
        text_lang: Some(lang.to_string()),
        prompt_lang: Some(lang.to_string()),
        speed_factor: Some(CLONE_SPEED_FACTOR),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::VoiceSource;
    use crate::infrastructure::memory::InMemoryVoiceRegistry;

    fn resolver(overrides: VoiceConfig) -> VoiceResolver {
        let registry = Arc::new(InMemoryVoiceRegistry::with_builtin_voices());
        VoiceResolver::new(
            registry,
            VoiceResolverConfig {
                default_voice: "Doubao".into(),
                overrides,
                defaults: VoiceConfig {
                    top_k: Some(5),
                    speed_factor: Some(1.0),
                    text_lang: Some("zh".into()),
                    ..Default::default()
                },
            },
        )
    }

    #[test]
    fn test_default_resolves_to_default_voice() {
        let resolved = resolver(VoiceConfig::default()).resolve(&VoiceDirective::Default);
        assert_eq!(resolved.identity, VoiceIdentity::builtin("Doubao"));
        assert_eq!(resolved.config.top_k, Some(5));
        assert!(resolved.config.gpt_weights.is_some());
    }

    #[test]
    fn test_overrides_apply_to_builtin() {
        let overrides = VoiceConfig {
            text_lang: Some("en".into()),
            ..Default::default()
        };
        let resolved =
            resolver(overrides).resolve(&VoiceDirective::Named("Luo Xiang".into()));
        assert_eq!(resolved.identity.name(), "Luo Xiang");
        assert_eq!(resolved.config.text_lang(), "en");
    }

    #[test]
    fn test_unknown_named_falls_back() {
        let resolved =
            resolver(VoiceConfig::default()).resolve(&VoiceDirective::Named("Ghost".into()));
        assert_eq!(resolved.identity, VoiceIdentity::builtin("Doubao"));
    }

    #[test]
    fn test_custom_uses_clone_defaults() {
        let overrides = VoiceConfig {
            text_lang: Some("ja".into()),
            ..Default::default()
        };
        let resolved = resolver(overrides).resolve(&VoiceDirective::Custom {
            ref_audio: "/tmp/ref.wav".into(),
            prompt_text: "Hello there".into(),
            lang: "en".into(),
        });
        assert_eq!(resolved.identity.source(), VoiceSource::Custom);
        assert_eq!(resolved.config.gpt_weights.as_deref(), Some(CLONE_GPT_WEIGHTS));
        assert_eq!(resolved.config.reference_audio.as_deref(), Some("/tmp/ref.wav"));
        // 显式覆盖不作用于克隆音色
        assert_eq!(resolved.config.text_lang(), "en");
        assert_eq!(resolved.config.speed_factor(), CLONE_SPEED_FACTOR);
        assert_eq!(resolved.config.top_k, Some(5));
    }

    #[test]
    fn test_trained_uses_directive_weights() {
        let resolved = resolver(VoiceConfig::default()).resolve(&VoiceDirective::Trained {
            gpt_weights: "/w/g.ckpt".into(),
            sovits_weights: "/w/s.pth".into(),
            ref_audio: "/r.wav".into(),
            prompt_text: "p".into(),
            lang: "zh".into(),
        });
        assert_eq!(resolved.identity.source(), VoiceSource::Trained);
        assert_eq!(resolved.config.gpt_weights.as_deref(), Some("/w/g.ckpt"));
        assert!(resolved.config.repository.is_none());
    }

    #[test]
    fn test_parse_uses_registry() {
        let r = resolver(VoiceConfig::default());
        let parsed = r.parse("VOICE:Doubao|你好");
        assert_eq!(parsed.directive, VoiceDirective::Named("Doubao".into()));
        let parsed = r.parse("VOICE:Unknown|你好");
        assert_eq!(parsed.directive, VoiceDirective::Named("Doubao".into()));
        assert_eq!(parsed.warnings.len(), 1);
    }
}
