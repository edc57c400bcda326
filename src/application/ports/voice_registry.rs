//! Voice Registry Port - 音色注册表

use crate::domain::voice::VoiceConfig;

/// 音色名 → 音色配置
pub trait VoiceRegistryPort: Send + Sync {
    /// 查询音色配置（返回副本）
    fn lookup(&self, name: &str) -> Option<VoiceConfig>;

    /// 所有已注册音色名（排序后）
    fn names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
