//! 应用层错误定义
//!
//! 单个片段的处理失败只终止该片段；只有传输层错误会终止事件循环

use thiserror::Error;

use crate::application::ports::{EngineError, SinkError, SourceError};
use crate::domain::ErrorStage;

/// 片段处理错误
#[derive(Debug, Error)]
pub enum SegmentError {
    /// 引擎构建失败
    #[error("{0}")]
    Initialization(String),

    /// 合成失败（空输出、推理异常、语言断言失败）
    #[error("{message}")]
    Synthesis {
        message: String,
        language_related: bool,
    },

    /// 输出通道故障
    #[error("Output transport failed: {0}")]
    Transport(#[from] SinkError),
}

impl SegmentError {
    pub fn initialization(err: EngineError) -> Self {
        Self::Initialization(err.to_string())
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
            language_related: false,
        }
    }

    /// 对应的出错阶段，传输层错误没有阶段
    pub fn stage(&self) -> Option<ErrorStage> {
        match self {
            Self::Initialization(_) => Some(ErrorStage::Init),
            Self::Synthesis { .. } => Some(ErrorStage::Synthesis),
            Self::Transport(_) => None,
        }
    }
}

impl From<EngineError> for SegmentError {
    fn from(err: EngineError) -> Self {
        Self::Synthesis {
            language_related: err.is_language_error(),
            message: err.to_string(),
        }
    }
}

/// 事件循环终止原因
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
