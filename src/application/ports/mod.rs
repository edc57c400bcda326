//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod event_source;
mod output_sink;
mod synthesis_engine;
mod voice_registry;

pub use event_source::{ControlCommand, EventSourcePort, InputEvent, SourceError};
pub use output_sink::{OutputSinkPort, SinkError};
pub use synthesis_engine::{
    AudioStream, EngineError, EngineFactory, EngineSpec, SynthesisEngine, SynthesisRequest,
};
pub use voice_registry::VoiceRegistryPort;
