//! JSON Lines 传输
//!
//! 输入（每行一个事件）：
//! - `{"type":"INPUT","id":"text","value":"...","metadata":{...}}`
//! - `{"type":"INPUT","id":"control","value":"reset"}`
//! - `{"type":"STOP"}`
//!
//! 输出（每行一个事件）：
//! - `{"id":"audio","value":[...],"metadata":{...,"sample_rate":32000,"duration":0.3}}`
//! - `{"id":"segment_complete","value":"completed","metadata":{...}}`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};
use tokio::sync::Mutex;

use crate::application::ports::{
    ControlCommand, EventSourcePort, InputEvent, OutputSinkPort, SinkError, SourceError,
};
use crate::domain::{OutputEvent, Segment, SegmentMetadata};

const TEXT_INPUT: &str = "text";
const CONTROL_INPUT: &str = "control";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
enum WireInput {
    Input {
        id: String,
        #[serde(default)]
        value: Value,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Stop,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireValue<'a> {
    Samples(&'a [f32]),
    Status(&'static str),
}

#[derive(Serialize)]
struct WireOutput<'a> {
    id: &'static str,
    value: WireValue<'a>,
    metadata: Map<String, Value>,
}

/// 输入值：字符串原样使用，JSON 对象等序列化为字符串交给指令解析
fn value_to_payload(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 从异步行读取器读取输入事件
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn decode(&self, line: &str) -> Option<InputEvent> {
        let wire: WireInput = match serde_json::from_str(line) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::warn!(line = self.line_no, error = %e, "Malformed input line skipped");
                return None;
            }
        };

        match wire {
            WireInput::Stop => Some(InputEvent::Stop),
            WireInput::Input {
                id,
                value,
                metadata,
            } => match id.as_str() {
                TEXT_INPUT => Some(InputEvent::Text(Segment::new(
                    value_to_payload(value),
                    SegmentMetadata::from_map(metadata),
                ))),
                CONTROL_INPUT => Some(InputEvent::Control(ControlCommand::parse(
                    &value_to_payload(value),
                ))),
                other => {
                    tracing::warn!(line = self.line_no, input = %other, "Unknown input id skipped");
                    None
                }
            },
        }
    }
}

impl JsonLinesSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSourcePort for JsonLinesSource<R> {
    async fn next_event(&mut self) -> Result<Option<InputEvent>, SourceError> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(e) => return Err(SourceError::Io(e.to_string())),
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(event) = self.decode(trimmed) {
                return Ok(Some(event));
            }
        }
    }
}

/// 把输出事件逐行写入异步写入器
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

/// 编码为单行 JSON（含换行符）
pub fn encode_event(event: &OutputEvent) -> Result<Vec<u8>, SinkError> {
    let value = match event {
        OutputEvent::Audio(fragment) => WireValue::Samples(&fragment.samples),
        OutputEvent::SegmentComplete(complete) => WireValue::Status(complete.status.as_str()),
    };
    let wire = WireOutput {
        id: event.output_id(),
        value,
        metadata: event.wire_metadata(),
    };
    let mut bytes = serde_json::to_vec(&wire).map_err(|e| SinkError::Encode(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_error(e: std::io::Error) -> SinkError {
    match e.kind() {
        ErrorKind::BrokenPipe => SinkError::Closed,
        _ => SinkError::Io(e.to_string()),
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> OutputSinkPort for JsonLinesSink<W> {
    async fn send(&self, event: OutputEvent) -> Result<(), SinkError> {
        let bytes = encode_event(&event)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&bytes).await.map_err(write_error)?;
        writer.flush().await.map_err(write_error)
    }
}
