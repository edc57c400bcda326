//! Output Protocol Emitter - 输出协议
//!
//! 把合成结果转换为 audio / segment_complete 事件序列，并透传片段元数据

use std::sync::Arc;

use crate::application::error::SegmentError;
use crate::application::ports::{OutputSinkPort, SinkError};
use crate::domain::{
    AudioFragment, CompletionStatus, OutputEvent, SegmentComplete, SegmentMetadata,
};

pub struct OutputEmitter {
    sink: Arc<dyn OutputSinkPort>,
}

impl OutputEmitter {
    pub fn new(sink: Arc<dyn OutputSinkPort>) -> Self {
        Self { sink }
    }

    /// 发送一个音频片段
    pub async fn audio(
        &self,
        samples: Vec<f32>,
        sample_rate: u32,
        duration: f64,
        metadata: &SegmentMetadata,
    ) -> Result<(), SinkError> {
        let sample_count = samples.len();
        self.sink
            .send(OutputEvent::Audio(AudioFragment {
                samples,
                sample_rate,
                duration,
                metadata: metadata.clone(),
            }))
            .await?;
        tracing::debug!(
            samples = sample_count,
            sample_rate,
            duration_secs = duration,
            "Audio fragment sent"
        );
        Ok(())
    }

    /// 片段成功完成
    pub async fn completed(&self, metadata: &SegmentMetadata) -> Result<(), SinkError> {
        self.terminal(CompletionStatus::Completed, metadata, None).await
    }

    /// 仅标点/空白的片段，跳过合成
    pub async fn skipped(&self, metadata: &SegmentMetadata) -> Result<(), SinkError> {
        self.terminal(CompletionStatus::Skipped, metadata, None).await
    }

    /// 片段失败
    pub async fn failed(
        &self,
        metadata: &SegmentMetadata,
        error: &SegmentError,
    ) -> Result<(), SinkError> {
        self.terminal(CompletionStatus::Error, metadata, Some(error))
            .await
    }

    async fn terminal(
        &self,
        status: CompletionStatus,
        metadata: &SegmentMetadata,
        error: Option<&SegmentError>,
    ) -> Result<(), SinkError> {
        self.sink
            .send(OutputEvent::SegmentComplete(SegmentComplete {
                status,
                metadata: metadata.clone(),
                error: error.map(|e| e.to_string()),
                error_stage: error.and_then(SegmentError::stage),
            }))
            .await?;
        tracing::debug!(status = status.as_str(), "Segment complete sent");
        Ok(())
    }
}
