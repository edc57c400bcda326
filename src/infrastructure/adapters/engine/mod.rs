//! Engine Adapter - 合成引擎实现

mod fake_engine;
mod http_engine;

pub use fake_engine::{FakeEngine, FakeEngineConfig, FakeEngineFactory};
pub use http_engine::{HttpEngine, HttpEngineConfig, HttpEngineFactory};
