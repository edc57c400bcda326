//! Audio Adapter - 合成服务返回音频的解码

mod wav_decoder;

pub use wav_decoder::{decode_wav, pcm_i16_le, DecodeError, DecodedPcm};

#[cfg(test)]
pub(crate) use wav_decoder::encode_wav_i16;
