//! HTTP Engine - 调用外部 GPT-SoVITS 推理服务
//!
//! 实现 EngineFactory / SynthesisEngine，通过 HTTP 调用推理服务
//!
//! 推理服务 API:
//! GET  /set_gpt_weights?weights_path=...
//! GET  /set_sovits_weights?weights_path=...
//! POST /tts  (JSON)
//!   media_type = "wav"  → 整段 WAV
//!   media_type = "raw"  + streaming_mode → 分块的 16-bit PCM 字节流

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::ports::{
    AudioStream, EngineError, EngineFactory, EngineSpec, SynthesisEngine, SynthesisRequest,
};
use crate::domain::voice::{VoiceConfig, VoiceIdentity};
use crate::domain::{AudioBuffer, AudioChunk};
use crate::infrastructure::adapters::audio::{decode_wav, pcm_i16_le};

const DEFAULT_SAMPLE_RATE: u32 = 32_000;
const DEFAULT_FRAGMENT_INTERVAL: f32 = 0.3;

/// 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    text_lang: &'a str,
    ref_audio_path: &'a str,
    prompt_text: &'a str,
    prompt_lang: &'a str,
    top_k: u32,
    top_p: f32,
    temperature: f32,
    text_split_method: &'a str,
    batch_size: u32,
    speed_factor: f32,
    split_bucket: bool,
    fragment_interval: f32,
    seed: i64,
    media_type: &'static str,
    streaming_mode: bool,
}

/// HTTP 引擎配置
#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    /// 推理服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 本地模型目录，相对路径的权重与参考音频以此为根
    pub models_dir: Option<PathBuf>,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9880".to_string(),
            timeout_secs: 120,
            models_dir: None,
        }
    }
}

impl HttpEngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = Some(dir.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// 相对路径按模型目录展开，绝对路径原样返回
    fn resolve_asset(&self, path: &str) -> String {
        match &self.models_dir {
            Some(dir) if !Path::new(path).is_absolute() => dir.join(path).display().to_string(),
            _ => path.to_string(),
        }
    }
}

fn request_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else if e.is_connect() {
        EngineError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        EngineError::NetworkError(e.to_string())
    }
}

/// 非 2xx 响应转换为引擎错误，语言参数断言失败单独归类
async fn check_status(response: Response) -> Result<Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
    if status == StatusCode::BAD_REQUEST
        && (body.contains("text_lang") || body.contains("prompt_lang"))
    {
        return Err(EngineError::InvalidLanguage(body));
    }
    Err(EngineError::ServiceError(format!("HTTP {}: {}", status, body)))
}

/// HTTP 引擎工厂
///
/// 构建即切换推理服务加载的模型权重。推理服务的权重是全局状态，
/// 两步切换中途失败时恢复之前的 GPT 权重
pub struct HttpEngineFactory {
    client: Client,
    config: HttpEngineConfig,
    /// 推理服务当前加载的 GPT 权重（最近一次完整切换成功）
    loaded_gpt: Mutex<Option<String>>,
}

impl HttpEngineFactory {
    pub fn new(config: HttpEngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            loaded_gpt: Mutex::new(None),
        })
    }

    async fn set_weights(&self, endpoint: &str, path: &str) -> Result<(), EngineError> {
        let url = self.config.url(endpoint);
        tracing::debug!(url = %url, weights_path = %path, "Switching model weights");

        let response = self
            .client
            .get(&url)
            .query(&[("weights_path", path)])
            .send()
            .await
            .map_err(request_error)?;
        check_status(response)
            .await
            .map_err(|e| EngineError::ModelLoad(format!("{}: {}", endpoint, e)))?;
        Ok(())
    }

    /// SoVITS 切换失败后把 GPT 权重切回上一个完整加载的音色
    async fn restore_gpt(&self, previous: Option<&str>, attempted: &str) {
        match previous {
            Some(path) if path != attempted => {
                tracing::warn!(weights_path = %path, "Restoring previous GPT weights");
                if let Err(e) = self.set_weights("/set_gpt_weights", path).await {
                    tracing::error!(
                        error = %e,
                        weights_path = %path,
                        "Failed to restore GPT weights, TTS service is left with mixed weights"
                    );
                }
            }
            Some(_) => {}
            None => {
                tracing::warn!("No previous GPT weights to restore");
            }
        }
    }
}

#[async_trait]
impl EngineFactory for HttpEngineFactory {
    async fn construct(&self, spec: &EngineSpec) -> Result<Box<dyn SynthesisEngine>, EngineError> {
        let mut voice = spec.voice_config.clone();

        let gpt = voice
            .gpt_weights
            .as_deref()
            .ok_or_else(|| EngineError::ModelLoad("GPT weights not configured".to_string()))?;
        let sovits = voice
            .sovits_weights
            .as_deref()
            .ok_or_else(|| EngineError::ModelLoad("SoVITS weights not configured".to_string()))?;
        let gpt = self.config.resolve_asset(gpt);
        let sovits = self.config.resolve_asset(sovits);

        tracing::info!(
            voice = %spec.identity,
            engine_voice = %spec.voice_name(),
            device = %spec.device,
            repository = ?voice.repository,
            "Initializing TTS engine"
        );

        // 持锁完成整个切换，保证记录的权重与服务状态一致
        let mut loaded_gpt = self.loaded_gpt.lock().await;
        self.set_weights("/set_gpt_weights", &gpt).await?;
        if let Err(e) = self.set_weights("/set_sovits_weights", &sovits).await {
            self.restore_gpt(loaded_gpt.as_deref(), &gpt).await;
            return Err(e);
        }
        *loaded_gpt = Some(gpt.clone());
        drop(loaded_gpt);

        voice.reference_audio = voice
            .reference_audio
            .as_deref()
            .map(|path| self.config.resolve_asset(path));
        voice.gpt_weights = Some(gpt);
        voice.sovits_weights = Some(sovits);

        Ok(Box::new(HttpEngine {
            client: self.client.clone(),
            tts_url: self.config.url("/tts"),
            identity: spec.identity.clone(),
            streaming: spec.streaming,
            chunk_duration: spec.chunk_duration,
            voice,
        }))
    }
}

/// 已加载权重的 HTTP 引擎
pub struct HttpEngine {
    client: Client,
    tts_url: String,
    identity: VoiceIdentity,
    streaming: bool,
    chunk_duration: f32,
    voice: VoiceConfig,
}

impl HttpEngine {
    fn sample_rate(&self) -> u32 {
        self.voice.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    fn body<'a>(&'a self, request: &'a SynthesisRequest, streaming: bool) -> TtsHttpRequest<'a> {
        let v = &self.voice;
        TtsHttpRequest {
            text: &request.text,
            text_lang: &request.language,
            ref_audio_path: v.reference_audio.as_deref().unwrap_or_default(),
            prompt_text: v.prompt_text.as_deref().unwrap_or_default(),
            prompt_lang: v.prompt_lang(),
            top_k: v.top_k.unwrap_or(5),
            top_p: v.top_p.unwrap_or(1.0),
            temperature: v.temperature.unwrap_or(1.0),
            text_split_method: v.text_split_method.as_deref().unwrap_or("cut5"),
            batch_size: v.batch_size.unwrap_or(1),
            speed_factor: request.speed,
            split_bucket: v.split_bucket.unwrap_or(true),
            fragment_interval: request
                .fragment_interval
                .unwrap_or(DEFAULT_FRAGMENT_INTERVAL),
            seed: v.seed.unwrap_or(-1),
            media_type: if streaming { "raw" } else { "wav" },
            streaming_mode: streaming,
        }
    }

    async fn post(&self, request: &SynthesisRequest, streaming: bool) -> Result<Response, EngineError> {
        let body = self.body(request, streaming);
        tracing::debug!(
            url = %self.tts_url,
            text_len = request.text.len(),
            text_lang = %body.text_lang,
            prompt_lang = %body.prompt_lang,
            streaming,
            "Sending TTS request"
        );
        let response = self
            .client
            .post(&self.tts_url)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await
    }
}

#[async_trait]
impl SynthesisEngine for HttpEngine {
    fn voice_identity(&self) -> &VoiceIdentity {
        &self.identity
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioChunk, EngineError> {
        let response = self.post(request, false).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EngineError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        let pcm = decode_wav(bytes.to_vec())
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))?;
        tracing::debug!(
            samples = pcm.samples.len(),
            sample_rate = pcm.sample_rate,
            "TTS audio decoded"
        );
        Ok(AudioChunk::new(pcm.sample_rate, AudioBuffer::I16(pcm.samples)))
    }

    async fn synthesize_streaming(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioStream, EngineError> {
        if !self.streaming {
            return Err(EngineError::StreamingUnsupported);
        }
        let response = self.post(request, true).await?;
        let sample_rate = self.sample_rate();
        let chunk_samples = ((self.chunk_duration * sample_rate as f32) as usize).max(1);
        Ok(pcm_chunks(
            Box::pin(response.bytes_stream()),
            sample_rate,
            chunk_samples,
        ))
    }

    async fn release(&self) {
        tracing::debug!(voice = %self.identity, "HTTP engine released");
    }
}

struct ChunkerState<S> {
    bytes: S,
    carry: Option<u8>,
    pending: Vec<i16>,
    sample_rate: u32,
    chunk_samples: usize,
    finished: bool,
}

impl<S> ChunkerState<S> {
    fn push(&mut self, data: &[u8]) {
        let (samples, rest) = match self.carry.take() {
            Some(byte) => {
                let mut joined = Vec::with_capacity(data.len() + 1);
                joined.push(byte);
                joined.extend_from_slice(data);
                pcm_i16_le(&joined)
            }
            None => pcm_i16_le(data),
        };
        self.pending.extend(samples);
        self.carry = rest;
    }

    fn take_chunk(&mut self, len: usize) -> AudioChunk {
        let rest = self.pending.split_off(len.min(self.pending.len()));
        let chunk = std::mem::replace(&mut self.pending, rest);
        AudioChunk::new(self.sample_rate, AudioBuffer::I16(chunk))
    }
}

/// 把任意分块的 PCM 字节流重组为固定时长的音频片段
fn pcm_chunks<S, B, E>(bytes: S, sample_rate: u32, chunk_samples: usize) -> AudioStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = ChunkerState {
        bytes,
        carry: None,
        pending: Vec::new(),
        sample_rate,
        chunk_samples,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if st.pending.len() >= st.chunk_samples {
                let chunk = st.take_chunk(st.chunk_samples);
                return Some((Ok(chunk), st));
            }
            if st.finished {
                if st.pending.is_empty() {
                    return None;
                }
                let chunk = st.take_chunk(st.pending.len());
                return Some((Ok(chunk), st));
            }
            match st.bytes.next().await {
                Some(Ok(data)) => st.push(data.as_ref()),
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.clear();
                    return Some((Err(EngineError::NetworkError(e.to_string())), st));
                }
                None => st.finished = true,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::audio::encode_wav_i16;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    type RequestLog = Arc<StdMutex<Vec<String>>>;

    /// 读取一个 HTTP 请求，返回请求行
    async fn read_request(socket: &mut TcpStream) -> Option<String> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        head.lines().next().map(str::to_string)
    }

    /// 本地推理服务：记录请求行，按路由函数返回 (状态码, 响应体)
    async fn stub_service<F>(route: F) -> (String, RequestLog)
    where
        F: Fn(&str) -> (u16, Vec<u8>) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log: RequestLog = Arc::new(StdMutex::new(Vec::new()));
        let route = Arc::new(route);
        let requests = log.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let route = route.clone();
                let requests = requests.clone();
                tokio::spawn(async move {
                    let Some(line) = read_request(&mut socket).await else {
                        return;
                    };
                    requests.lock().unwrap().push(line.clone());
                    let (status, body) = route(&line);
                    let head = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        (format!("http://{}", addr), log)
    }

    fn spec(name: &str, slug: &str, streaming: bool) -> EngineSpec {
        EngineSpec {
            identity: VoiceIdentity::builtin(name),
            device: "cpu".into(),
            streaming,
            // 8 Hz * 0.5 s = 每片 4 个样本
            chunk_duration: 0.5,
            voice_config: VoiceConfig {
                gpt_weights: Some(format!("GPT_weights/{}.ckpt", slug)),
                sovits_weights: Some(format!("SoVITS_weights/{}.pth", slug)),
                reference_audio: Some(format!("ref_audios/{}.wav", slug)),
                sample_rate: Some(8),
                ..Default::default()
            },
        }
    }

    fn synthesis_request() -> SynthesisRequest {
        SynthesisRequest {
            text: "你好".into(),
            language: "zh".into(),
            speed: 1.0,
            fragment_interval: None,
        }
    }

    async fn engine_for<F>(route: F, streaming: bool) -> Box<dyn SynthesisEngine>
    where
        F: Fn(&str) -> (u16, Vec<u8>) + Send + Sync + 'static,
    {
        let (url, _) = stub_service(route).await;
        let factory = HttpEngineFactory::new(HttpEngineConfig::new(url).with_timeout(5)).unwrap();
        match factory.construct(&spec("Doubao", "doubao", streaming)).await {
            Ok(engine) => engine,
            Err(e) => panic!("construct failed: {}", e),
        }
    }

    fn le_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_config_default() {
        let config = HttpEngineConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:9880");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.models_dir.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = HttpEngineConfig::new("http://example.com:9000/")
            .with_timeout(60)
            .with_models_dir("/models");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.url("/tts"), "http://example.com:9000/tts");
        assert_eq!(
            config.resolve_asset("GPT_weights/a.ckpt"),
            "/models/GPT_weights/a.ckpt"
        );
        assert_eq!(config.resolve_asset("/abs/a.ckpt"), "/abs/a.ckpt");
    }

    #[test]
    fn test_request_body_uses_voice_defaults() {
        let engine = HttpEngine {
            client: Client::new(),
            tts_url: "http://localhost/tts".into(),
            identity: VoiceIdentity::builtin("Doubao"),
            streaming: true,
            chunk_duration: 0.3,
            voice: VoiceConfig {
                reference_audio: Some("/models/ref.wav".into()),
                prompt_lang: Some("zh".into()),
                top_k: Some(15),
                ..Default::default()
            },
        };
        let request = SynthesisRequest {
            text: "你好".into(),
            language: "zh".into(),
            speed: 1.1,
            fragment_interval: None,
        };

        let body = serde_json::to_value(engine.body(&request, true)).unwrap();
        assert_eq!(body["ref_audio_path"], "/models/ref.wav");
        assert_eq!(body["top_k"], 15);
        assert_eq!(body["text_split_method"], "cut5");
        assert_eq!(body["media_type"], "raw");
        assert_eq!(body["streaming_mode"], true);
        assert_eq!(body["seed"], -1);
    }

    #[tokio::test]
    async fn test_pcm_chunks_regroup_odd_boundaries() {
        let samples: Vec<i16> = (0..10).collect();
        let bytes = le_bytes(&samples);
        // 在样本中间切开
        let parts: Vec<Result<Vec<u8>, String>> = vec![
            Ok(bytes[..3].to_vec()),
            Ok(bytes[3..11].to_vec()),
            Ok(bytes[11..].to_vec()),
        ];

        let chunks: Vec<_> = pcm_chunks(stream::iter(parts), 16_000, 4)
            .collect::<Vec<_>>()
            .await;

        let lens: Vec<usize> = chunks
            .iter()
            .map(|c| c.as_ref().unwrap().samples.len())
            .collect();
        assert_eq!(lens, vec![4, 4, 2]);
        match &chunks[2].as_ref().unwrap().samples {
            AudioBuffer::I16(tail) => assert_eq!(tail, &vec![8, 9]),
            other => panic!("unexpected buffer: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pcm_chunks_error_ends_stream() {
        let parts: Vec<Result<Vec<u8>, String>> =
            vec![Ok(le_bytes(&[1, 2])), Err("connection reset".into())];

        let items: Vec<_> = pcm_chunks(stream::iter(parts), 16_000, 4)
            .collect::<Vec<_>>()
            .await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(EngineError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_failed_sovits_switch_restores_previous_gpt_weights() {
        let (url, requests) = stub_service(|line| {
            if line.contains("/set_sovits_weights") && line.contains("luoxiang") {
                (500, b"failed to load sovits weights".to_vec())
            } else {
                (200, b"success".to_vec())
            }
        })
        .await;
        let factory = HttpEngineFactory::new(HttpEngineConfig::new(url).with_timeout(5)).unwrap();

        assert!(factory.construct(&spec("Doubao", "doubao", false)).await.is_ok());
        let err = match factory.construct(&spec("Luo Xiang", "luoxiang", false)).await {
            Err(e) => e,
            Ok(_) => panic!("expected SoVITS switch to fail"),
        };
        assert!(matches!(err, EngineError::ModelLoad(_)));

        // 服务端最后加载的 GPT 权重回到 Doubao
        let log = requests.lock().unwrap().clone();
        let last_gpt = log
            .iter()
            .rev()
            .find(|line| line.contains("/set_gpt_weights"))
            .unwrap();
        assert!(last_gpt.contains("doubao.ckpt"), "GPT weights left at: {}", last_gpt);
        assert_eq!(
            factory.loaded_gpt.lock().await.as_deref(),
            Some("GPT_weights/doubao.ckpt")
        );
    }

    #[tokio::test]
    async fn test_first_failed_switch_has_nothing_to_restore() {
        let (url, requests) = stub_service(|line| {
            if line.contains("/set_sovits_weights") {
                (500, b"no".to_vec())
            } else {
                (200, b"success".to_vec())
            }
        })
        .await;
        let factory = HttpEngineFactory::new(HttpEngineConfig::new(url).with_timeout(5)).unwrap();

        assert!(factory.construct(&spec("Doubao", "doubao", false)).await.is_err());
        assert_eq!(requests.lock().unwrap().len(), 2);
        assert!(factory.loaded_gpt.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_synthesize_decodes_wav_response() {
        let wav = encode_wav_i16(&[100, -200, 300], 24_000, 1);
        let engine = engine_for(
            move |line| {
                if line.starts_with("POST /tts") {
                    (200, wav.clone())
                } else {
                    (200, b"success".to_vec())
                }
            },
            false,
        )
        .await;

        let chunk = engine.synthesize(&synthesis_request()).await.unwrap();
        assert_eq!(chunk.sample_rate, 24_000);
        assert_eq!(chunk.samples, AudioBuffer::I16(vec![100, -200, 300]));
    }

    #[tokio::test]
    async fn test_language_rejection_maps_to_invalid_language() {
        let engine = engine_for(
            |line| {
                if line.starts_with("POST /tts") {
                    (400, br#"{"message":"text_lang: cn is not supported"}"#.to_vec())
                } else {
                    (200, b"success".to_vec())
                }
            },
            false,
        )
        .await;

        match engine.synthesize(&synthesis_request()).await {
            Err(EngineError::InvalidLanguage(body)) => assert!(body.contains("text_lang")),
            other => panic!("expected InvalidLanguage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_maps_to_service_error() {
        let engine = engine_for(
            |line| {
                if line.starts_with("POST /tts") {
                    (500, b"CUDA out of memory".to_vec())
                } else {
                    (200, b"success".to_vec())
                }
            },
            false,
        )
        .await;

        match engine.synthesize(&synthesis_request()).await {
            Err(EngineError::ServiceError(message)) => {
                assert!(message.contains("500"));
                assert!(message.contains("CUDA out of memory"));
            }
            other => panic!("expected ServiceError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_streaming_response_is_rechunked() {
        let samples: Vec<i16> = (0..10).collect();
        let pcm = le_bytes(&samples);
        let engine = engine_for(
            move |line| {
                if line.starts_with("POST /tts") {
                    (200, pcm.clone())
                } else {
                    (200, b"success".to_vec())
                }
            },
            true,
        )
        .await;

        let stream = match engine.synthesize_streaming(&synthesis_request()).await {
            Ok(stream) => stream,
            Err(e) => panic!("streaming failed: {}", e),
        };
        let chunks: Vec<AudioChunk> = stream
            .map(|item| item.unwrap())
            .collect::<Vec<_>>()
            .await;

        let lens: Vec<usize> = chunks.iter().map(|c| c.samples.len()).collect();
        assert_eq!(lens, vec![4, 4, 2]);
        assert!(chunks.iter().all(|c| c.sample_rate == 8));
    }

    #[tokio::test]
    async fn test_unreadable_error_body_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut socket).await;
            // 声明 100 字节，只发送 7 字节后断开
            let _ = socket
                .write_all(b"HTTP/1.1 500 Stub\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial")
                .await;
            let _ = socket.shutdown().await;
        });

        let response = Client::new()
            .post(format!("http://{}/tts", addr))
            .send()
            .await
            .unwrap();
        match check_status(response).await {
            Err(EngineError::ServiceError(message)) => {
                assert!(message.contains("<unreadable body:"), "{}", message)
            }
            other => panic!("expected ServiceError, got {:?}", other),
        }
    }
}
