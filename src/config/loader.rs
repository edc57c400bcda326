//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::{AppConfig, EngineBackend};
use crate::domain::voice::checked_language;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 默认音色不存在时的回退音色
pub const FALLBACK_VOICE: &str = "Doubao";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXSTREAM_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXSTREAM_VOICE__NAME="Luo Xiang"`
/// - `VOXSTREAM_VOICE__TEXT_LANG=en`
/// - `VOXSTREAM_SYNTHESIS__RETURN_FRAGMENT=true`
/// - `VOXSTREAM_ENGINE__URL=http://tts-server:9880`
/// - `VOXSTREAM_ENGINE__MODELS_DIR=/data/models`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("voice.name", FALLBACK_VOICE)?
        .set_default("synthesis.top_k", 5)?
        .set_default("synthesis.top_p", 1.0)?
        .set_default("synthesis.temperature", 1.0)?
        .set_default("synthesis.batch_size", 100)?
        .set_default("synthesis.seed", -1)?
        .set_default("synthesis.text_split_method", "cut5")?
        .set_default("synthesis.split_bucket", true)?
        .set_default("synthesis.return_fragment", false)?
        .set_default("synthesis.use_gpu", false)?
        .set_default("synthesis.device", "cpu")?
        .set_default("synthesis.sample_rate", 32000)?
        .set_default("synthesis.chunk_duration", 0.3)?
        .set_default("engine.backend", "http")?
        .set_default("engine.url", "http://127.0.0.1:9880")?
        .set_default("engine.timeout_secs", 120)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: VOXSTREAM_ENGINE__URL=http://tts-server:9880
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("VOXSTREAM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.voice.name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Voice name cannot be empty".to_string(),
        ));
    }

    if config.engine.backend == EngineBackend::Http && config.engine.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Engine URL cannot be empty".to_string(),
        ));
    }

    if config.synthesis.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "Sample rate cannot be 0".to_string(),
        ));
    }

    if config.synthesis.chunk_duration <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Chunk duration must be positive".to_string(),
        ));
    }

    if let Some(speed) = config.synthesis.speed_factor {
        if speed <= 0.0 {
            return Err(ConfigError::ValidationError(
                "Speed factor must be positive".to_string(),
            ));
        }
    }

    Ok(())
}

/// 校验语言配置
///
/// 非法语言代码只记录错误（附修正提示），不阻止启动
pub fn check_languages(config: &mut AppConfig) {
    if let Some(code) = config.voice.text_lang.take() {
        tracing::debug!(text_lang = %code, "TEXT_LANG from config");
        config.voice.text_lang = Some(checked_language(&code, "TEXT_LANG"));
    }
    if let Some(code) = config.voice.prompt_lang.take() {
        tracing::debug!(prompt_lang = %code, "PROMPT_LANG from config");
        config.voice.prompt_lang = Some(checked_language(&code, "PROMPT_LANG"));
    }
}

/// 默认音色不在注册表中时回退到 `Doubao`
pub fn ensure_known_voice(config: &mut AppConfig, known: &[String]) {
    if known.iter().any(|name| name == &config.voice.name) {
        return;
    }
    tracing::error!(
        voice = %config.voice.name,
        available = ?known,
        "Unknown voice, falling back to {}",
        FALLBACK_VOICE
    );
    config.voice.name = FALLBACK_VOICE.to_string();
}

/// 检查模型目录，问题只记录日志
///
/// 返回存在的模型目录
pub fn check_models_dir(config: &AppConfig) -> Option<PathBuf> {
    if config.engine.backend != EngineBackend::Http {
        return None;
    }
    let Some(dir) = &config.engine.models_dir else {
        tracing::warn!("engine.models_dir not set; weight paths are passed to the TTS service as-is");
        return None;
    };
    if !dir.exists() {
        tracing::error!(path = %dir.display(), "Models directory does not exist");
        return None;
    }
    if !dir.join("GPT_weights").exists() || !dir.join("SoVITS_weights").exists() {
        tracing::warn!(
            path = %dir.display(),
            "Expected GPT_weights/ and SoVITS_weights/ under models directory"
        );
    }
    Some(dir.clone())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Voxstream Configuration ===");
    tracing::info!("Voice: {}", config.voice.name);
    tracing::info!(
        "Text Lang: {} / Prompt Lang: {}",
        config.voice.text_lang.as_deref().unwrap_or("(voice default)"),
        config.voice.prompt_lang.as_deref().unwrap_or("(voice default)")
    );
    if let Some(path) = &config.voice.registry_file {
        tracing::info!("Voice Registry File: {:?}", path);
    }
    tracing::info!("Engine Backend: {:?}", config.engine.backend);
    if config.engine.backend == EngineBackend::Http {
        tracing::info!("Engine URL: {}", config.engine.url);
        tracing::info!("Engine Timeout: {}s", config.engine.timeout_secs);
        tracing::info!("Models Directory: {:?}", config.engine.models_dir);
    }
    tracing::info!("Device: {}", config.synthesis.effective_device());
    tracing::info!("Streaming: {}", config.synthesis.return_fragment);
    if config.synthesis.return_fragment {
        tracing::info!("Chunk Duration: {}s", config.synthesis.chunk_duration);
    }
    if let Some(speed) = config.synthesis.speed_factor {
        tracing::info!("Speed Factor Override: {}", speed);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("===============================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_voice() {
        let mut config = AppConfig::default();
        config.voice.name = "  ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_url() {
        let mut config = AppConfig::default();
        config.engine.url = String::new();
        assert!(validate_config(&config).is_err());

        // fake 后端不需要 URL
        config.engine.backend = EngineBackend::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_bad_numbers() {
        let mut config = AppConfig::default();
        config.synthesis.chunk_duration = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.synthesis.speed_factor = Some(-1.0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[voice]
name = "Luo Xiang"
text_lang = "zh"

[synthesis]
return_fragment = true
speed_factor = 1.1

[engine]
backend = "fake"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.voice.name, "Luo Xiang");
        assert_eq!(config.voice.text_lang.as_deref(), Some("zh"));
        assert!(config.synthesis.return_fragment);
        assert_eq!(config.synthesis.speed_factor, Some(1.1));
        assert_eq!(config.engine.backend, EngineBackend::Fake);
        // 未设置的项使用默认值
        assert_eq!(config.synthesis.top_k, 5);
    }

    #[test]
    fn test_invalid_language_is_kept() {
        let mut config = AppConfig::default();
        config.voice.text_lang = Some("cn".into());
        check_languages(&mut config);
        assert_eq!(config.voice.text_lang.as_deref(), Some("cn"));
    }

    #[test]
    fn test_unknown_voice_falls_back() {
        let mut config = AppConfig::default();
        config.voice.name = "Nobody".into();
        ensure_known_voice(&mut config, &["Doubao".to_string(), "Maple".to_string()]);
        assert_eq!(config.voice.name, FALLBACK_VOICE);

        config.voice.name = "Maple".into();
        ensure_known_voice(&mut config, &["Doubao".to_string(), "Maple".to_string()]);
        assert_eq!(config.voice.name, "Maple");
    }

    #[test]
    fn test_models_dir_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.engine.models_dir = Some(dir.path().to_path_buf());
        assert_eq!(check_models_dir(&config), Some(dir.path().to_path_buf()));

        config.engine.models_dir = Some(dir.path().join("missing"));
        assert_eq!(check_models_dir(&config), None);
    }
}
