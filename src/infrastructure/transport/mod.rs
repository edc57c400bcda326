//! Transport - 输入事件源与输出通道实现

mod json_lines;
mod memory;

pub use json_lines::{encode_event, JsonLinesSink, JsonLinesSource};
pub use memory::{MemorySink, MemorySource};
