//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 音色身份（决定引擎是否重建）
//! - 音色配置及合并规则
//! - 语言代码校验

mod errors;
pub mod language;
mod value_objects;

pub use errors::VoiceError;
pub use language::{checked_language, coerce_directive_language, validate_language, VALID_LANGUAGES};
pub use value_objects::{VoiceConfig, VoiceIdentity, VoiceSource};
