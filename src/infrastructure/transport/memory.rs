//! 内存传输（嵌入式使用与测试）

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::application::ports::{
    EventSourcePort, InputEvent, OutputSinkPort, SinkError, SourceError,
};
use crate::domain::OutputEvent;

/// 收集输出事件
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<OutputEvent>>,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收到事件的副本
    pub fn events(&self) -> Vec<OutputEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// 取走已收到的事件
    pub fn take(&self) -> Vec<OutputEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    /// 关闭后所有发送返回 `SinkError::Closed`
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OutputSinkPort for MemorySink {
    async fn send(&self, event: OutputEvent) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        self.events
            .lock()
            .map_err(|e| SinkError::Io(e.to_string()))?
            .push(event);
        Ok(())
    }
}

/// 基于 mpsc 通道的输入事件源，所有发送端关闭即事件源关闭
pub struct MemorySource {
    rx: mpsc::Receiver<InputEvent>,
}

impl MemorySource {
    pub fn channel(buffer: usize) -> (mpsc::Sender<InputEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }

    /// 预先装入固定事件序列
    pub fn from_events(events: Vec<InputEvent>) -> Self {
        let (tx, source) = Self::channel(events.len());
        for event in events {
            if tx.try_send(event).is_err() {
                tracing::warn!("Memory source buffer full, event dropped");
            }
        }
        source
    }
}

#[async_trait]
impl EventSourcePort for MemorySource {
    async fn next_event(&mut self) -> Result<Option<InputEvent>, SourceError> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ControlCommand;

    #[tokio::test]
    async fn test_channel_source_closes_with_sender() {
        let (tx, mut source) = MemorySource::channel(4);
        tx.send(InputEvent::Control(ControlCommand::Reset))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(
            source.next_event().await.unwrap(),
            Some(InputEvent::Control(ControlCommand::Reset))
        );
        assert_eq!(source.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_closed_sink_rejects_events() {
        use crate::domain::{CompletionStatus, SegmentComplete, SegmentMetadata};

        let sink = MemorySink::new();
        let event = OutputEvent::SegmentComplete(SegmentComplete {
            status: CompletionStatus::Skipped,
            metadata: SegmentMetadata::new(),
            error: None,
            error_stage: None,
        });
        sink.send(event.clone()).await.unwrap();
        sink.close();
        assert!(matches!(sink.send(event).await, Err(SinkError::Closed)));
        assert_eq!(sink.take().len(), 1);
        assert!(sink.events().is_empty());
    }
}
