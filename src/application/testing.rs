//! 测试用引擎替身

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;

use crate::application::ports::{
    AudioStream, EngineError, EngineFactory, EngineSpec, SynthesisEngine, SynthesisRequest,
};
use crate::domain::voice::VoiceIdentity;
use crate::domain::{AudioBuffer, AudioChunk};

/// 单次调用的预设结果
#[derive(Debug, Clone)]
pub enum Outcome {
    Audio(AudioChunk),
    Fail(String),
    InvalidLanguage(String),
}

impl Outcome {
    /// `secs` 秒的 i16 静音
    pub fn silence(sample_rate: u32, secs: f64) -> Self {
        let len = (sample_rate as f64 * secs).round() as usize;
        Self::Audio(AudioChunk::new(sample_rate, AudioBuffer::I16(vec![0; len])))
    }

    pub fn empty(sample_rate: u32) -> Self {
        Self::Audio(AudioChunk::new(sample_rate, AudioBuffer::F32(Vec::new())))
    }

    fn into_result(self) -> Result<AudioChunk, EngineError> {
        match self {
            Self::Audio(chunk) => Ok(chunk),
            Self::Fail(msg) => Err(EngineError::ServiceError(msg)),
            Self::InvalidLanguage(msg) => Err(EngineError::InvalidLanguage(msg)),
        }
    }
}

/// 引擎行为脚本
#[derive(Debug, Clone)]
pub struct EngineScript {
    pub streaming: bool,
    pub batch: Outcome,
    pub fragments: Vec<Outcome>,
}

impl Default for EngineScript {
    fn default() -> Self {
        Self {
            streaming: false,
            batch: Outcome::silence(32_000, 1.2),
            fragments: Vec::new(),
        }
    }
}

#[derive(Default)]
struct FactoryState {
    fail: Option<String>,
    script: EngineScript,
    constructs: usize,
    last_spec: Option<EngineSpec>,
}

#[derive(Default)]
pub struct ScriptedFactory {
    state: Mutex<FactoryState>,
    releases: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: EngineScript) -> Self {
        let factory = Self::default();
        factory.set_script(script);
        factory
    }

    /// 之后构建的引擎使用新脚本
    pub fn set_script(&self, script: EngineScript) {
        self.state.lock().unwrap().script = script;
    }

    pub fn fail_construct(&self, message: &str) {
        self.state.lock().unwrap().fail = Some(message.to_string());
    }

    pub fn succeed_construct(&self) {
        self.state.lock().unwrap().fail = None;
    }

    pub fn construct_count(&self) -> usize {
        self.state.lock().unwrap().constructs
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn last_spec(&self) -> Option<EngineSpec> {
        self.state.lock().unwrap().last_spec.clone()
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EngineFactory for ScriptedFactory {
    async fn construct(&self, spec: &EngineSpec) -> Result<Box<dyn SynthesisEngine>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.constructs += 1;
        state.last_spec = Some(spec.clone());
        if let Some(msg) = &state.fail {
            return Err(EngineError::ModelLoad(msg.clone()));
        }
        Ok(Box::new(ScriptedEngine {
            identity: spec.identity.clone(),
            script: state.script.clone(),
            releases: self.releases.clone(),
            requests: self.requests.clone(),
        }))
    }
}

struct ScriptedEngine {
    identity: VoiceIdentity,
    script: EngineScript,
    releases: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

#[async_trait]
impl SynthesisEngine for ScriptedEngine {
    fn voice_identity(&self) -> &VoiceIdentity {
        &self.identity
    }

    fn supports_streaming(&self) -> bool {
        self.script.streaming
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioChunk, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script.batch.clone().into_result()
    }

    async fn synthesize_streaming(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioStream, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        let items: Vec<_> = self
            .script
            .fragments
            .iter()
            .cloned()
            .map(Outcome::into_result)
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
