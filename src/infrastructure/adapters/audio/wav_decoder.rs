//! WAV Decoder - 基于 symphonia 的音频解码
//!
//! 合成服务返回 16-bit PCM WAV（整段）或裸 PCM（流式），统一解码为单声道 i16

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("WAV decoding failed: {0}")]
    Decoding(String),
}

/// 解码后的单声道 PCM
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPcm {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

/// 解码 WAV，多声道取平均混为单声道
pub fn decode_wav(data: Vec<u8>) -> Result<DecodedPcm, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Decoding(format!("Probe failed: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::Decoding("No audio track found".to_string()))?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::Decoding("Unknown sample rate".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Decoding(format!("Decoder creation failed: {}", e)))?;

    let mut samples: Vec<i16> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(DecodeError::Decoding(format!("Packet read error: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Decode error (skipping packet): {}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        let channels = spec.channels.count().max(1);
        let mut buf = SampleBuffer::<i16>::new(frames as u64, spec);
        buf.copy_interleaved_ref(decoded);

        let interleaved = &buf.samples()[..frames * channels];
        if channels == 1 {
            samples.extend_from_slice(interleaved);
        } else {
            samples.extend(interleaved.chunks_exact(channels).map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            }));
        }
    }

    Ok(DecodedPcm {
        samples,
        sample_rate,
    })
}

/// 裸 16-bit 小端 PCM 转 i16，末尾不足一个样本的字节返回给调用方
pub fn pcm_i16_le(bytes: &[u8]) -> (Vec<i16>, Option<u8>) {
    let chunks = bytes.chunks_exact(2);
    let remainder = chunks.remainder().first().copied();
    let samples = chunks
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    (samples, remainder)
}

#[cfg(test)]
pub(crate) fn encode_wav_i16(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_size = (samples.len() * 2) as u32;
    let mut wav = Vec::with_capacity(44 + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
    wav.extend_from_slice(&(channels * 2).to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}
