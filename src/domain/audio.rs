//! 音频缓冲区
//!
//! 引擎可能返回不同采样格式的 PCM，统一在输出前归一化为 f32

/// 单声道 PCM 样本
#[derive(Debug, Clone, PartialEq)]
pub enum AudioBuffer {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I16(Vec<i16>),
    I32(Vec<i32>),
}

impl AudioBuffer {
    pub fn len(&self) -> usize {
        match self {
            Self::F32(s) => s.len(),
            Self::F64(s) => s.len(),
            Self::I16(s) => s.len(),
            Self::I32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 转换为 [-1.0, 1.0] 范围的 f32 样本
    pub fn into_f32(self) -> Vec<f32> {
        match self {
            Self::F32(s) => s,
            Self::F64(s) => s.into_iter().map(|v| v as f32).collect(),
            Self::I16(s) => s.into_iter().map(|v| v as f32 / 32768.0).collect(),
            Self::I32(s) => s.into_iter().map(|v| v as f32 / 2_147_483_648.0).collect(),
        }
    }
}

/// 引擎返回的一段音频
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub sample_rate: u32,
    pub samples: AudioBuffer,
}

impl AudioChunk {
    pub fn new(sample_rate: u32, samples: AudioBuffer) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }
}

/// 时长（秒）
pub fn duration_secs(sample_count: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f64 / sample_rate as f64
}
