//! Memory Layer - In-Memory State Management
//!
//! 实现 VoiceRegistry，内置音色常驻内存，可从 TOML 文件扩展

mod voice_registry;

pub use voice_registry::{InMemoryVoiceRegistry, RegistryError, BUILTIN_REPOSITORY};
