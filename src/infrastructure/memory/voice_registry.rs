//! In-Memory Voice Registry Implementation

use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::application::ports::VoiceRegistryPort;
use crate::domain::voice::VoiceConfig;

/// 内置音色所在的模型仓库
pub const BUILTIN_REPOSITORY: &str = "MoYoYoTech/tone-models";

/// 内置音色：(名称, 模型文件前缀, 参考音频, 语言)
const BUILTIN_VOICES: &[(&str, &str, &str, &str)] = &[
    ("Doubao", "doubao-mixed", "doubao_ref_mix_new.wav", "zh"),
    ("Luo Xiang", "luoxiang", "luoxiang_ref.wav", "zh"),
    ("Yang Mi", "yangmi", "yangmi_ref.wav", "zh"),
    ("Zhou Jielun", "zhoujielun", "zhoujielun_ref.wav", "zh"),
    ("Ma Yun", "mayun", "mayun_ref.wav", "zh"),
    ("Chen Yifan", "yfc", "yfc_ref.wav", "zh"),
    ("Zhao Daniu", "dnz", "dnz_ref.wav", "zh"),
    ("BYS", "bys", "bys_ref.wav", "zh"),
    ("Ma Baoguo", "mabaoguo", "mabaoguo_ref.wav", "zh"),
    ("Shen Yi", "shenyi", "shenyi_ref.wav", "zh"),
    ("Maple", "maple", "maple_ref.wav", "en"),
    ("Cove", "cove", "cove_ref.wav", "en"),
    ("Ellen", "ellen", "ellen_ref.wav", "en"),
    ("Juniper", "juniper", "juniper_ref.wav", "en"),
    ("Trump", "trump", "trump_ref.wav", "en"),
];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read voice registry file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse voice registry file {path}: {message}")]
    Parse { path: String, message: String },
}

/// 音色注册表文件格式
///
/// ```toml
/// [voices."My Voice"]
/// gpt_weights = "GPT_weights/my.ckpt"
/// sovits_weights = "SoVITS_weights/my.pth"
/// reference_audio = "ref_audios/my.wav"
/// text_lang = "en"
/// ```
#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    voices: HashMap<String, VoiceConfig>,
}

/// 内存音色注册表
pub struct InMemoryVoiceRegistry {
    voices: DashMap<String, VoiceConfig>,
}

impl InMemoryVoiceRegistry {
    pub fn new() -> Self {
        Self {
            voices: DashMap::new(),
        }
    }

    /// 预置内置音色
    pub fn with_builtin_voices() -> Self {
        let registry = Self::new();
        for (name, model, reference, lang) in BUILTIN_VOICES {
            registry.register(
                *name,
                VoiceConfig {
                    repository: Some(BUILTIN_REPOSITORY.to_string()),
                    gpt_weights: Some(format!("GPT_weights/{}.ckpt", model)),
                    sovits_weights: Some(format!("SoVITS_weights/{}.pth", model)),
                    reference_audio: Some(format!("ref_audios/{}", reference)),
                    text_lang: Some(lang.to_string()),
                    prompt_lang: Some(lang.to_string()),
                    ..Default::default()
                },
            );
        }
        registry
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册或替换音色
    pub fn register(&self, name: impl Into<String>, config: VoiceConfig) {
        let name = name.into();
        if self.voices.insert(name.clone(), config).is_some() {
            tracing::debug!(voice = %name, "Voice config replaced");
        }
    }

    /// 从 TOML 文件加载额外音色，同名音色会被覆盖
    ///
    /// 返回加载的音色数
    pub fn load_toml_file(&self, path: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let file: RegistryFile = toml::from_str(&content).map_err(|e| RegistryError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let count = file.voices.len();
        for (name, config) in file.voices {
            self.register(name, config);
        }
        tracing::info!(path = %path.display(), voices = count, "Voice registry file loaded");
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

impl Default for InMemoryVoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceRegistryPort for InMemoryVoiceRegistry {
    fn lookup(&self, name: &str) -> Option<VoiceConfig> {
        self.voices.get(name).map(|v| v.clone())
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.voices.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn contains(&self, name: &str) -> bool {
        self.voices.contains_key(name)
    }
}
