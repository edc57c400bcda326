//! Synthesis Dispatcher - 流式 / 整段合成调度
//!
//! 流式片段到达即发送，出错时已发送的片段不会撤回

use futures_util::StreamExt;
use std::time::Instant;

use crate::application::emitter::OutputEmitter;
use crate::application::error::SegmentError;
use crate::application::ports::{SynthesisEngine, SynthesisRequest};
use crate::domain::audio::duration_secs;
use crate::domain::{AudioChunk, SegmentMetadata};

/// 单个片段的合成统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DispatchOutcome {
    /// 已发送的音频片段数
    pub fragments: usize,
    /// 已发送的音频总时长（秒）
    pub audio_secs: f64,
}

pub struct SynthesisDispatcher {
    streaming_enabled: bool,
}

impl SynthesisDispatcher {
    pub fn new(streaming_enabled: bool) -> Self {
        Self { streaming_enabled }
    }

    pub async fn dispatch(
        &self,
        engine: &dyn SynthesisEngine,
        request: &SynthesisRequest,
        emitter: &OutputEmitter,
        metadata: &SegmentMetadata,
    ) -> Result<DispatchOutcome, SegmentError> {
        tracing::debug!(
            text_len = request.text.chars().count(),
            language = %request.language,
            speed = request.speed,
            streaming = self.streaming_enabled && engine.supports_streaming(),
            "Synthesis start"
        );

        if self.streaming_enabled && engine.supports_streaming() {
            self.dispatch_streaming(engine, request, emitter, metadata)
                .await
        } else {
            self.dispatch_batch(engine, request, emitter, metadata).await
        }
    }

    async fn dispatch_streaming(
        &self,
        engine: &dyn SynthesisEngine,
        request: &SynthesisRequest,
        emitter: &OutputEmitter,
        metadata: &SegmentMetadata,
    ) -> Result<DispatchOutcome, SegmentError> {
        let started = Instant::now();
        let mut stream = engine.synthesize_streaming(request).await?;
        let mut outcome = DispatchOutcome::default();
        let mut received = 0usize;

        while let Some(item) = stream.next().await {
            received += 1;
            let chunk = item?;
            if chunk.samples.is_empty() {
                tracing::warn!(fragment = received, "Skipping empty audio fragment");
                continue;
            }
            let (samples, sample_rate, duration) = normalize(chunk)?;
            emitter.audio(samples, sample_rate, duration, metadata).await?;
            outcome.fragments += 1;
            outcome.audio_secs += duration;
        }

        tracing::info!(
            fragments = outcome.fragments,
            audio_secs = outcome.audio_secs,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Streaming synthesis finished"
        );

        if outcome.fragments == 0 {
            return Err(SegmentError::synthesis(
                "No audio fragments produced during streaming synthesis",
            ));
        }
        Ok(outcome)
    }

    async fn dispatch_batch(
        &self,
        engine: &dyn SynthesisEngine,
        request: &SynthesisRequest,
        emitter: &OutputEmitter,
        metadata: &SegmentMetadata,
    ) -> Result<DispatchOutcome, SegmentError> {
        let started = Instant::now();
        let chunk = engine.synthesize(request).await?;
        if chunk.samples.is_empty() {
            return Err(SegmentError::synthesis("TTS returned empty audio array"));
        }
        let (samples, sample_rate, duration) = normalize(chunk)?;
        let sample_count = samples.len();
        emitter.audio(samples, sample_rate, duration, metadata).await?;

        tracing::info!(
            samples = sample_count,
            audio_secs = duration,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Batch synthesis finished"
        );
        Ok(DispatchOutcome {
            fragments: 1,
            audio_secs: duration,
        })
    }
}

/// 归一化为 f32 并计算时长
fn normalize(chunk: AudioChunk) -> Result<(Vec<f32>, u32, f64), SegmentError> {
    if chunk.sample_rate == 0 {
        return Err(SegmentError::synthesis("Engine reported a sample rate of 0"));
    }
    let sample_rate = chunk.sample_rate;
    let samples = chunk.samples.into_f32();
    let duration = duration_secs(samples.len(), sample_rate);
    Ok((samples, sample_rate, duration))
}
