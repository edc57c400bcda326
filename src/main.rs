//! Voxstream - 流式语音合成节点
//!
//! 从 stdin 读取 JSON Lines 输入事件，向 stdout 写出音频与片段完成事件，
//! 日志输出到 stderr

use std::sync::Arc;

use voxstream::application::{
    EngineFactory, EngineManager, OutputEmitter, SessionEventLoop, VoiceRegistryPort,
    VoiceResolver,
};
use voxstream::config::{
    check_languages, check_models_dir, ensure_known_voice, load_config, print_config,
    EngineBackend, LogConfig,
};
use voxstream::infrastructure::adapters::{FakeEngineFactory, HttpEngineConfig, HttpEngineFactory};
use voxstream::infrastructure::memory::InMemoryVoiceRegistry;
use voxstream::infrastructure::transport::{JsonLinesSink, JsonLinesSource};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},voxstream={}", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let mut config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);
    tracing::info!("Voxstream - streaming speech synthesis node");

    // 音色注册表
    let registry = InMemoryVoiceRegistry::with_builtin_voices();
    if let Some(path) = &config.voice.registry_file {
        if let Err(e) = registry.load_toml_file(path) {
            tracing::error!(error = %e, "Failed to load voice registry file, using built-in voices");
        }
    }
    ensure_known_voice(&mut config, &registry.names());
    check_languages(&mut config);
    print_config(&config);

    // 合成引擎
    let factory: Arc<dyn EngineFactory> = match config.engine.backend {
        EngineBackend::Http => {
            let mut engine_config = HttpEngineConfig::new(&config.engine.url)
                .with_timeout(config.engine.timeout_secs);
            if let Some(dir) = check_models_dir(&config) {
                engine_config = engine_config.with_models_dir(dir);
            }
            Arc::new(HttpEngineFactory::new(engine_config)?)
        }
        EngineBackend::Fake => {
            tracing::warn!("Using fake engine, output is a test tone");
            Arc::new(FakeEngineFactory::with_defaults())
        }
    };

    let resolver = VoiceResolver::new(registry.arc(), config.resolver_config());
    let engines = EngineManager::new(factory, config.engine_options());
    let emitter = OutputEmitter::new(Arc::new(JsonLinesSink::stdout()));
    let mut session = SessionEventLoop::new(resolver, engines, emitter);

    session.warm_up().await;

    let mut source = JsonLinesSource::stdin();
    let stats = session.run(&mut source).await?;

    tracing::info!(
        segments = stats.segments,
        completed = stats.completed,
        failed = stats.failed,
        uptime_secs = stats.uptime_secs(),
        "Voxstream shutdown complete"
    );

    Ok(())
}
