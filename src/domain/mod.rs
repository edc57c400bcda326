//! Domain Layer - 领域层
//!
//! - Voice Context: 音色身份、配置与语言校验
//! - Segment Context: 输入片段、元数据透传与输出事件
//! - 音色指令解析与文本过滤

pub mod audio;
pub mod directive;
pub mod segment;
pub mod voice;

mod text_filter;

pub use audio::{AudioBuffer, AudioChunk};
pub use directive::{parse_payload, DirectiveError, ParsedPayload, VoiceDirective};
pub use segment::{
    AudioFragment, CompletionStatus, ErrorStage, OutputEvent, Segment, SegmentComplete,
    SegmentMetadata,
};
pub use text_filter::is_punctuation_only;
