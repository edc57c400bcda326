//! Segment Context - 输入片段与输出事件
//!
//! 不变量:
//! - 每个输入片段恰好产生一个 SegmentComplete
//! - 输入元数据的所有键原样出现在该片段的每个输出事件上
//!   （保留键 sample_rate / duration / error / error_stage 除外）

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_QUESTION_ID: &str = "default";
pub const DEFAULT_SESSION_STATUS: &str = "unknown";

/// 会话结束状态（由上游文本分段器设置）
const TERMINAL_SESSION_STATUSES: &[&str] = &["completed", "finished", "ended", "final"];

/// 片段元数据（透传）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentMetadata(Map<String, Value>);

impl SegmentMetadata {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn question_id(&self) -> Option<&Value> {
        self.0.get("question_id")
    }

    pub fn session_status(&self) -> Option<&str> {
        self.0.get("session_status").and_then(Value::as_str)
    }

    /// 片段序号（仅用于日志，缺失为 -1）
    pub fn segment_index(&self) -> i64 {
        match self.0.get("segment_index") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
            Some(Value::String(s)) => s.parse().unwrap_or(-1),
            _ => -1,
        }
    }

    pub fn is_session_final(&self) -> bool {
        self.session_status()
            .is_some_and(|s| TERMINAL_SESSION_STATUSES.contains(&s))
    }

    /// 输出事件使用的元数据：原样保留输入键，缺失的 question_id / session_status 填默认值
    pub fn passthrough(&self) -> Self {
        let mut map = self.0.clone();
        map.entry("question_id")
            .or_insert_with(|| Value::from(DEFAULT_QUESTION_ID));
        map.entry("session_status")
            .or_insert_with(|| Value::from(DEFAULT_SESSION_STATUS));
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// 输入片段
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// 原始负载（JSON 信封或纯文本）
    pub payload: String,
    pub metadata: SegmentMetadata,
}

impl Segment {
    pub fn new(payload: impl Into<String>, metadata: SegmentMetadata) -> Self {
        Self {
            payload: payload.into(),
            metadata,
        }
    }
}

/// 片段结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Completed,
    Error,
    Skipped,
    Empty,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Skipped => "skipped",
            Self::Empty => "empty",
        }
    }
}

/// 出错阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStage {
    Init,
    Synthesis,
}

impl ErrorStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Synthesis => "synthesis",
        }
    }
}

/// 音频片段
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFragment {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// 时长（秒）
    pub duration: f64,
    pub metadata: SegmentMetadata,
}

/// 片段结束信号
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentComplete {
    pub status: CompletionStatus,
    pub metadata: SegmentMetadata,
    pub error: Option<String>,
    pub error_stage: Option<ErrorStage>,
}

/// 输出事件
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Audio(AudioFragment),
    SegmentComplete(SegmentComplete),
}

impl OutputEvent {
    /// 输出通道名
    pub fn output_id(&self) -> &'static str {
        match self {
            Self::Audio(_) => "audio",
            Self::SegmentComplete(_) => "segment_complete",
        }
    }

    pub fn metadata(&self) -> &SegmentMetadata {
        match self {
            Self::Audio(fragment) => &fragment.metadata,
            Self::SegmentComplete(complete) => &complete.metadata,
        }
    }

    /// 线上格式的元数据：透传键 + 事件自身字段
    ///
    /// `sample_rate` `duration` `error` `error_stage` 为保留键，
    /// 输入元数据中的同名值会被事件字段覆盖（记录警告）
    pub fn wire_metadata(&self) -> Map<String, Value> {
        let mut map = self.metadata().as_map().clone();
        let mut put = |key: &str, value: Value| {
            if let Some(previous) = map.insert(key.to_string(), value.clone()) {
                if previous != value {
                    tracing::warn!(
                        key,
                        input = %previous,
                        event = %value,
                        "Reserved metadata key overwritten by event field"
                    );
                }
            }
        };
        match self {
            Self::Audio(fragment) => {
                put("sample_rate", Value::from(fragment.sample_rate));
                put("duration", Value::from(fragment.duration));
            }
            Self::SegmentComplete(complete) => {
                if let Some(error) = &complete.error {
                    put("error", Value::from(error.as_str()));
                }
                if let Some(stage) = complete.error_stage {
                    put("error_stage", Value::from(stage.as_str()));
                }
            }
        }
        map
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SegmentComplete(_))
    }
}
