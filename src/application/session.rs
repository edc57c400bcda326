//! Session Event Loop - 会话事件循环
//!
//! 单任务顺序处理输入事件：上一个片段的合成与输出完成后才读取下一个事件。
//! 会话状态（计数、当前引擎）保存在循环自身，不使用全局变量。

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::dispatcher::SynthesisDispatcher;
use crate::application::emitter::OutputEmitter;
use crate::application::engine_manager::EngineManager;
use crate::application::error::{LoopError, SegmentError};
use crate::application::ports::{
    ControlCommand, EventSourcePort, InputEvent, SinkError, SynthesisRequest,
};
use crate::application::voice_resolver::{ResolvedVoice, VoiceResolver};
use crate::domain::directive::{truncate, VoiceDirective};
use crate::domain::voice::VALID_LANGUAGES;
use crate::domain::{is_punctuation_only, CompletionStatus, Segment, SegmentMetadata};

/// 会话计数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub session_id: Uuid,
    /// 收到的文本片段数
    pub segments: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    /// 成功的合成调用数（流式与整段）
    pub syntheses: u64,
    /// 已输出的音频总时长（秒）
    pub total_audio_secs: f64,
    pub started_at: DateTime<Utc>,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            segments: 0,
            completed: 0,
            skipped: 0,
            failed: 0,
            syntheses: 0,
            total_audio_secs: 0.0,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

pub struct SessionEventLoop {
    resolver: VoiceResolver,
    engines: EngineManager,
    dispatcher: SynthesisDispatcher,
    emitter: OutputEmitter,
    stats: SessionStats,
}

impl SessionEventLoop {
    pub fn new(resolver: VoiceResolver, engines: EngineManager, emitter: OutputEmitter) -> Self {
        let dispatcher = SynthesisDispatcher::new(engines.options().streaming);
        Self {
            resolver,
            engines,
            dispatcher,
            emitter,
            stats: SessionStats::new(),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn engines(&self) -> &EngineManager {
        &self.engines
    }

    /// 预加载默认音色，失败时推迟到第一个片段
    pub async fn warm_up(&mut self) {
        let voice = self.resolver.resolve(&VoiceDirective::Default);
        tracing::info!(voice = %voice.identity, "Pre-loading default voice models");
        match self.engines.ensure_engine(&voice).await {
            Ok(_) => tracing::info!(voice = %voice.identity, "Default voice ready"),
            Err(e) => tracing::warn!(
                voice = %voice.identity,
                error = %e,
                "Failed to pre-load models, will load on first use"
            ),
        }
    }

    /// 运行事件循环直到收到 Stop 或事件源关闭
    ///
    /// 只有传输层错误会使循环提前返回；退出前释放引擎
    pub async fn run<S>(&mut self, source: &mut S) -> Result<SessionStats, LoopError>
    where
        S: EventSourcePort + ?Sized,
    {
        tracing::info!(session_id = %self.stats.session_id, "Session event loop started");
        let result = self.run_events(source).await;
        self.engines.shutdown().await;

        match &result {
            Ok(()) => tracing::info!(
                session_id = %self.stats.session_id,
                segments = self.stats.segments,
                completed = self.stats.completed,
                skipped = self.stats.skipped,
                failed = self.stats.failed,
                audio_secs = self.stats.total_audio_secs,
                "Session event loop stopped"
            ),
            Err(e) => tracing::error!(error = %e, "Session event loop aborted"),
        }
        result.map(|()| self.stats.clone())
    }

    async fn run_events<S>(&mut self, source: &mut S) -> Result<(), LoopError>
    where
        S: EventSourcePort + ?Sized,
    {
        while let Some(event) = source.next_event().await? {
            match event {
                InputEvent::Text(segment) => {
                    self.process_segment(segment).await?;
                }
                InputEvent::Control(command) => {
                    self.handle_control(&command);
                }
                InputEvent::Stop => {
                    tracing::info!("Received stop event");
                    return Ok(());
                }
            }
        }
        tracing::info!("Event source closed");
        Ok(())
    }

    /// 处理一个文本片段，恰好发送一个 SegmentComplete
    pub async fn process_segment(
        &mut self,
        segment: Segment,
    ) -> Result<CompletionStatus, SinkError> {
        self.stats.segments += 1;
        let metadata = segment.metadata.passthrough();
        let parsed = self.resolver.parse(&segment.payload);

        tracing::info!(
            segment_index = metadata.segment_index(),
            question_id = ?metadata.question_id(),
            session_status = ?metadata.session_status(),
            text = %truncate(&parsed.text, 50),
            "Processing segment"
        );

        if is_punctuation_only(&parsed.text) {
            tracing::info!(text = %parsed.text, "Skipping punctuation-only segment");
            self.stats.skipped += 1;
            self.emitter.skipped(&metadata).await?;
            return Ok(CompletionStatus::Skipped);
        }

        let voice = self.resolver.resolve(&parsed.directive);
        let status = match self.synthesize(&voice, &parsed.text, &metadata).await {
            Ok(()) => {
                self.stats.completed += 1;
                self.emitter.completed(&metadata).await?;
                CompletionStatus::Completed
            }
            Err(SegmentError::Transport(e)) => return Err(e),
            Err(err) => {
                self.stats.failed += 1;
                self.log_failure(&voice, &err);
                self.emitter.failed(&metadata, &err).await?;
                CompletionStatus::Error
            }
        };

        if metadata.is_session_final() {
            tracing::info!(
                question_id = ?metadata.question_id(),
                session_status = ?metadata.session_status(),
                "Session finished, all segments processed"
            );
        }
        Ok(status)
    }

    async fn synthesize(
        &mut self,
        voice: &ResolvedVoice,
        text: &str,
        metadata: &SegmentMetadata,
    ) -> Result<(), SegmentError> {
        let engine = self.engines.ensure_engine(voice).await?;
        let request = SynthesisRequest {
            text: text.to_string(),
            language: voice.config.text_lang().to_string(),
            speed: voice.config.speed_factor(),
            fragment_interval: voice.config.fragment_interval,
        };
        let outcome = self
            .dispatcher
            .dispatch(engine, &request, &self.emitter, metadata)
            .await?;

        self.stats.syntheses += 1;
        self.stats.total_audio_secs += outcome.audio_secs;
        Ok(())
    }

    fn log_failure(&self, voice: &ResolvedVoice, err: &SegmentError) {
        match err {
            SegmentError::Initialization(_) => {
                tracing::error!(voice = %voice.identity, error = %err, "TTS initialization failed");
            }
            SegmentError::Synthesis {
                language_related: true,
                ..
            } => {
                tracing::error!(error = %err, "LANGUAGE CONFIGURATION ERROR");
                tracing::error!(
                    text_lang = voice.config.text_lang(),
                    prompt_lang = voice.config.prompt_lang(),
                    "Current language settings"
                );
                tracing::error!("Valid languages: {}", VALID_LANGUAGES.join(", "));
                tracing::error!("Common mistake: use 'zh' for Chinese, not 'cn'");
            }
            _ => {
                tracing::error!(voice = %voice.identity, error = %err, "TTS synthesis error");
            }
        }
    }

    /// 处理控制命令，`stats` 返回当前计数
    pub fn handle_control(&self, command: &ControlCommand) -> Option<SessionStats> {
        match command {
            ControlCommand::Reset => {
                tracing::info!("Reset acknowledged");
                None
            }
            ControlCommand::Stats => {
                tracing::info!(
                    segments = self.stats.segments,
                    completed = self.stats.completed,
                    skipped = self.stats.skipped,
                    failed = self.stats.failed,
                    syntheses = self.stats.syntheses,
                    audio_secs = self.stats.total_audio_secs,
                    uptime_secs = self.stats.uptime_secs(),
                    voice = ?self.engines.loaded_identity().map(ToString::to_string),
                    "Session stats"
                );
                Some(self.stats.clone())
            }
            ControlCommand::Unknown(other) => {
                tracing::warn!(command = %other, "Unknown control command ignored");
                None
            }
        }
    }
}
