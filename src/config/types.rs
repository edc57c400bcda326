//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::{EngineOptions, VoiceResolverConfig};
use crate::domain::voice::VoiceConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 音色配置
    #[serde(default)]
    pub voice: VoiceSettings,

    /// 合成参数
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 合成引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 音色解析配置：显式设置的项覆盖内置音色，其余合成参数作为所有音色的默认值
    pub fn resolver_config(&self) -> VoiceResolverConfig {
        VoiceResolverConfig {
            default_voice: self.voice.name.clone(),
            overrides: VoiceConfig {
                prompt_text: self.voice.prompt_text.clone(),
                text_lang: self.voice.text_lang.clone(),
                prompt_lang: self.voice.prompt_lang.clone(),
                speed_factor: self.synthesis.speed_factor,
                fragment_interval: self.synthesis.fragment_interval,
                ..Default::default()
            },
            defaults: self.synthesis.voice_defaults(),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            device: self.synthesis.effective_device(),
            streaming: self.synthesis.return_fragment,
            chunk_duration: self.synthesis.chunk_duration,
        }
    }
}

/// 音色配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceSettings {
    /// 默认音色名
    #[serde(default = "default_voice_name")]
    pub name: String,

    /// 覆盖参考音频的提示文本
    #[serde(default)]
    pub prompt_text: Option<String>,

    /// 合成文本语言
    #[serde(default)]
    pub text_lang: Option<String>,

    /// 参考音频语言
    #[serde(default)]
    pub prompt_lang: Option<String>,

    /// 额外音色注册表文件（TOML）
    #[serde(default)]
    pub registry_file: Option<PathBuf>,
}

fn default_voice_name() -> String {
    "Doubao".to_string()
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            name: default_voice_name(),
            prompt_text: None,
            text_lang: None,
            prompt_lang: None,
            registry_file: None,
        }
    }
}

/// 合成参数
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 语速覆盖（仅内置音色）
    #[serde(default)]
    pub speed_factor: Option<f32>,

    /// 片段间隔覆盖（秒，仅内置音色）
    #[serde(default)]
    pub fragment_interval: Option<f32>,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_one")]
    pub top_p: f32,

    #[serde(default = "default_one")]
    pub temperature: f32,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// 随机种子，-1 为随机
    #[serde(default = "default_seed")]
    pub seed: i64,

    #[serde(default = "default_text_split_method")]
    pub text_split_method: String,

    #[serde(default = "default_true")]
    pub split_bucket: bool,

    /// 是否流式返回音频片段
    #[serde(default)]
    pub return_fragment: bool,

    #[serde(default)]
    pub use_gpu: bool,

    /// 推理设备（cpu / cuda:N）
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// 流式片段时长（秒）
    #[serde(default = "default_chunk_duration")]
    pub chunk_duration: f32,
}

fn default_top_k() -> u32 {
    5
}

fn default_one() -> f32 {
    1.0
}

fn default_batch_size() -> u32 {
    100
}

fn default_seed() -> i64 {
    -1
}

fn default_text_split_method() -> String {
    "cut5".to_string()
}

fn default_true() -> bool {
    true
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_sample_rate() -> u32 {
    32000
}

fn default_chunk_duration() -> f32 {
    0.3
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            speed_factor: None,
            fragment_interval: None,
            top_k: default_top_k(),
            top_p: default_one(),
            temperature: default_one(),
            batch_size: default_batch_size(),
            seed: default_seed(),
            text_split_method: default_text_split_method(),
            split_bucket: default_true(),
            return_fragment: false,
            use_gpu: false,
            device: default_device(),
            sample_rate: default_sample_rate(),
            chunk_duration: default_chunk_duration(),
        }
    }
}

impl SynthesisConfig {
    /// 仅在启用 GPU 且设备为 cuda 时使用 cuda
    pub fn effective_device(&self) -> String {
        if self.use_gpu && self.device.starts_with("cuda") {
            self.device.clone()
        } else {
            "cpu".to_string()
        }
    }

    /// 所有音色共用的默认合成参数
    pub fn voice_defaults(&self) -> VoiceConfig {
        VoiceConfig {
            top_k: Some(self.top_k),
            top_p: Some(self.top_p),
            temperature: Some(self.temperature),
            batch_size: Some(self.batch_size),
            seed: Some(self.seed),
            text_split_method: Some(self.text_split_method.clone()),
            split_bucket: Some(self.split_bucket),
            return_fragment: Some(self.return_fragment),
            use_gpu: Some(self.use_gpu),
            device: Some(self.effective_device()),
            sample_rate: Some(self.sample_rate),
            ..Default::default()
        }
    }
}

/// 引擎后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// GPT-SoVITS HTTP 推理服务
    #[default]
    Http,
    /// 本地正弦波，不依赖推理服务
    Fake,
}

/// 合成引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub backend: EngineBackend,

    /// 推理服务基础 URL
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,

    /// 本地模型目录
    #[serde(default)]
    pub models_dir: Option<PathBuf>,
}

fn default_engine_url() -> String {
    "http://127.0.0.1:9880".to_string()
}

fn default_engine_timeout() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::default(),
            url: default_engine_url(),
            timeout_secs: default_engine_timeout(),
            models_dir: None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
