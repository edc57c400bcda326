//! Engine Lifecycle Manager - 引擎生命周期管理
//!
//! 不变量:
//! - 最多持有一个引擎
//! - 当且仅当尚无引擎或音色身份变化时重建
//! - 构建失败时保留原有引擎，不采用半成品

use std::sync::Arc;
use std::time::Instant;

use crate::application::error::SegmentError;
use crate::application::ports::{EngineFactory, EngineSpec, SynthesisEngine};
use crate::application::voice_resolver::ResolvedVoice;
use crate::domain::voice::VoiceIdentity;

/// 引擎构建的节点级参数
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub device: String,
    pub streaming: bool,
    pub chunk_duration: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            device: "cpu".to_string(),
            streaming: false,
            chunk_duration: 0.3,
        }
    }
}

pub struct EngineManager {
    factory: Arc<dyn EngineFactory>,
    options: EngineOptions,
    engine: Option<Box<dyn SynthesisEngine>>,
}

impl EngineManager {
    pub fn new(factory: Arc<dyn EngineFactory>, options: EngineOptions) -> Self {
        Self {
            factory,
            options,
            engine: None,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// 当前已加载的音色身份
    pub fn loaded_identity(&self) -> Option<&VoiceIdentity> {
        self.engine.as_ref().map(|e| e.voice_identity())
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// 确保引擎已按给定音色加载
    pub async fn ensure_engine(
        &mut self,
        voice: &ResolvedVoice,
    ) -> Result<&dyn SynthesisEngine, SegmentError> {
        let needs_build = match self.loaded_identity() {
            Some(current) if current == &voice.identity => false,
            Some(current) => {
                tracing::info!(
                    from = %current,
                    to = %voice.identity,
                    "Voice changed, reloading model"
                );
                true
            }
            None => {
                tracing::debug!(voice = %voice.identity, "Loading models for the first time");
                true
            }
        };

        if needs_build {
            let spec = EngineSpec {
                identity: voice.identity.clone(),
                device: self.options.device.clone(),
                streaming: self.options.streaming,
                chunk_duration: self.options.chunk_duration,
                voice_config: voice.config.clone(),
            };
            let started = Instant::now();
            let engine = self.factory.construct(&spec).await.map_err(|e| {
                tracing::error!(voice = %voice.identity, error = %e, "TTS init error");
                SegmentError::initialization(e)
            })?;
            tracing::info!(
                voice = %voice.identity,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "TTS engine ready"
            );

            if let Some(previous) = self.engine.replace(engine) {
                tracing::debug!(voice = %previous.voice_identity(), "Releasing previous engine");
                previous.release().await;
            }
        }

        self.engine
            .as_deref()
            .ok_or_else(|| SegmentError::Initialization("TTS engine not initialized".into()))
    }

    /// 释放当前引擎
    pub async fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.release().await;
        }
    }
}
