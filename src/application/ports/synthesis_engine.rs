//! Synthesis Engine Port - 合成引擎抽象
//!
//! 引擎本身是外部能力（模型加载、推理），具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::voice::{VoiceConfig, VoiceIdentity};
use crate::domain::AudioChunk;

/// 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// 引擎对 text_lang / prompt_lang 的断言失败
    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Streaming synthesis is not supported by this engine")]
    StreamingUnsupported,
}

impl EngineError {
    pub fn is_language_error(&self) -> bool {
        matches!(self, Self::InvalidLanguage(_))
    }
}

/// 引擎构建参数
#[derive(Debug, Clone)]
pub struct EngineSpec {
    /// 引擎对应的音色身份
    pub identity: VoiceIdentity,
    /// 推理设备（cpu / cuda:N）
    pub device: String,
    /// 是否启用流式合成
    pub streaming: bool,
    /// 流式片段时长（秒）
    pub chunk_duration: f32,
    /// 合并后的音色配置
    pub voice_config: VoiceConfig,
}

impl EngineSpec {
    pub fn voice_name(&self) -> String {
        self.identity.engine_voice_name()
    }
}

/// 合成请求
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: String,
    pub speed: f32,
    pub fragment_interval: Option<f32>,
}

/// 流式合成结果：惰性、有限、不可重启
pub type AudioStream = BoxStream<'static, Result<AudioChunk, EngineError>>;

/// 已加载的合成引擎
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// 引擎加载时对应的音色身份
    fn voice_identity(&self) -> &VoiceIdentity;

    /// 是否支持流式合成
    fn supports_streaming(&self) -> bool {
        false
    }

    /// 整段合成
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioChunk, EngineError>;

    /// 流式合成，按顺序逐段返回音频
    async fn synthesize_streaming(
        &self,
        _request: &SynthesisRequest,
    ) -> Result<AudioStream, EngineError> {
        Err(EngineError::StreamingUnsupported)
    }

    /// 释放引擎占用的资源（设备显存等）
    async fn release(&self) {}
}

/// 引擎工厂
///
/// 构建是同步阻塞的重操作（可能耗时数秒），失败不自动重试
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn construct(&self, spec: &EngineSpec) -> Result<Box<dyn SynthesisEngine>, EngineError>;
}
