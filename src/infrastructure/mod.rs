//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod memory;
pub mod transport;

pub use adapters::{FakeEngineFactory, HttpEngineFactory};
pub use memory::InMemoryVoiceRegistry;
pub use transport::{JsonLinesSink, JsonLinesSource, MemorySink, MemorySource};
