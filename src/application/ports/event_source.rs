//! Event Source Port - 输入事件源

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Segment;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read input: {0}")]
    Io(String),
}

/// 控制命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// 仅确认，无法中断正在进行的合成
    Reset,
    /// 输出统计计数
    Stats,
    Unknown(String),
}

impl ControlCommand {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "reset" => Self::Reset,
            "stats" => Self::Stats,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// 输入事件
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Text(Segment),
    Control(ControlCommand),
    Stop,
}

/// 有序输入事件源
///
/// 返回 `Ok(None)` 表示事件源已关闭
#[async_trait]
pub trait EventSourcePort: Send {
    async fn next_event(&mut self) -> Result<Option<InputEvent>, SourceError>;
}
