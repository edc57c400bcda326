//! Fake Engine - 不依赖推理服务的合成引擎
//!
//! 按文本长度生成低音量正弦波，用于联调和演示

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::f32::consts::PI;
use std::time::Duration;

use crate::application::ports::{
    AudioStream, EngineError, EngineFactory, EngineSpec, SynthesisEngine, SynthesisRequest,
};
use crate::domain::voice::VoiceIdentity;
use crate::domain::{AudioBuffer, AudioChunk};

/// Fake Engine 配置
#[derive(Debug, Clone)]
pub struct FakeEngineConfig {
    /// 输出采样率
    pub sample_rate: u32,
    /// 每个字符对应的音频时长（秒）
    pub secs_per_char: f32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
    /// 正弦波频率
    pub frequency: f32,
}

impl Default for FakeEngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 32_000,
            secs_per_char: 0.15,
            latency_ms: 200,
            frequency: 220.0,
        }
    }
}

pub struct FakeEngineFactory {
    config: FakeEngineConfig,
}

impl FakeEngineFactory {
    pub fn new(config: FakeEngineConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeEngineConfig::default())
    }
}

#[async_trait]
impl EngineFactory for FakeEngineFactory {
    async fn construct(&self, spec: &EngineSpec) -> Result<Box<dyn SynthesisEngine>, EngineError> {
        tracing::info!(
            voice = %spec.identity,
            device = %spec.device,
            streaming = spec.streaming,
            "FakeEngine initialized"
        );
        Ok(Box::new(FakeEngine {
            config: self.config.clone(),
            identity: spec.identity.clone(),
            streaming: spec.streaming,
            chunk_duration: spec.chunk_duration,
        }))
    }
}

pub struct FakeEngine {
    config: FakeEngineConfig,
    identity: VoiceIdentity,
    streaming: bool,
    chunk_duration: f32,
}

impl FakeEngine {
    fn render(&self, request: &SynthesisRequest) -> Vec<f32> {
        let chars = request.text.chars().count() as f32;
        let speed = if request.speed > 0.0 { request.speed } else { 1.0 };
        let secs = chars * self.config.secs_per_char / speed;
        let len = (secs * self.config.sample_rate as f32) as usize;
        let step = 2.0 * PI * self.config.frequency / self.config.sample_rate as f32;
        (0..len).map(|i| 0.1 * (i as f32 * step).sin()).collect()
    }

    async fn simulate_latency(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
    }
}

#[async_trait]
impl SynthesisEngine for FakeEngine {
    fn voice_identity(&self) -> &VoiceIdentity {
        &self.identity
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioChunk, EngineError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice = %self.identity,
            "FakeEngine: rendering tone"
        );
        self.simulate_latency().await;
        Ok(AudioChunk::new(
            self.config.sample_rate,
            AudioBuffer::F32(self.render(request)),
        ))
    }

    async fn synthesize_streaming(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioStream, EngineError> {
        self.simulate_latency().await;
        let sample_rate = self.config.sample_rate;
        let chunk_len = ((self.chunk_duration * sample_rate as f32) as usize).max(1);
        let chunks: Vec<Result<AudioChunk, EngineError>> = self
            .render(request)
            .chunks(chunk_len)
            .map(|c| Ok(AudioChunk::new(sample_rate, AudioBuffer::F32(c.to_vec()))))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}
