//! Output Sink Port - 输出通道

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::OutputEvent;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Output channel closed")]
    Closed,

    #[error("Failed to write output: {0}")]
    Io(String),

    #[error("Failed to encode output: {0}")]
    Encode(String),
}

/// 输出事件的下游通道
///
/// 发送失败视为传输层故障，事件循环随之终止
#[async_trait]
pub trait OutputSinkPort: Send + Sync {
    async fn send(&self, event: OutputEvent) -> Result<(), SinkError>;
}
