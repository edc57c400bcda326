//! Voxstream - 流式语音合成节点
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Context: 音色身份、配置与语言校验
//! - Segment Context: 输入片段、元数据透传与输出事件
//! - 音色指令解析、标点过滤
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SynthesisEngine, VoiceRegistry, OutputSink, EventSource）
//! - VoiceResolver / EngineManager / SynthesisDispatcher / OutputEmitter
//! - SessionEventLoop: 单任务顺序事件循环
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP 推理服务引擎、Fake 引擎、WAV 解码
//! - Memory: 内存音色注册表
//! - Transport: JSON Lines (stdin/stdout) 与内存通道

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
