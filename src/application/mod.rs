//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SynthesisEngine、VoiceRegistry、OutputSink、EventSource）
//! - voice_resolver / engine_manager / dispatcher / emitter: 片段处理流水线
//! - session: 会话事件循环
//! - error: 应用层错误定义

pub mod dispatcher;
pub mod emitter;
pub mod engine_manager;
pub mod error;
pub mod ports;
pub mod session;
pub mod voice_resolver;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use dispatcher::{DispatchOutcome, SynthesisDispatcher};
pub use emitter::OutputEmitter;
pub use engine_manager::{EngineManager, EngineOptions};
pub use error::{LoopError, SegmentError};
pub use session::{SessionEventLoop, SessionStats};
pub use voice_resolver::{ResolvedVoice, VoiceResolver, VoiceResolverConfig};

pub use ports::{
    AudioStream, ControlCommand, EngineError, EngineFactory, EngineSpec, EventSourcePort,
    InputEvent, OutputSinkPort, SinkError, SourceError, SynthesisEngine, SynthesisRequest,
    VoiceRegistryPort,
};
