// path: crates/shardd/src/config.rs
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ShardConfig {
    pub addr: String,
    /// JSONL с документами; None — пустой индекс (для смоука/тестов)
    #[serde(default)]
    pub index_path: Option<String>,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    #[serde(default = "default_max_cursors")]
    pub max_cursors: usize,
    #[serde(default = "default_mem_warn_bytes")]
    pub mem_warn_bytes: u64,
    #[serde(default = "default_mem_max_bytes")]
    pub mem_max_bytes: u64,
    /// Доля max_cursors, остающаяся в Expired после eviction-свипа
    #[serde(default = "default_revive_fraction")]
    pub revive_fraction: f64,
    #[serde(default = "default_page")]
    pub default_page: usize,
    #[serde(default = "default_service")]
    pub service: String,
}

fn default_idle_timeout_ms() -> u64 { 60_000 }
fn default_max_cursors() -> usize { 128 }
fn default_mem_warn_bytes() -> u64 { 768 * 1024 * 1024 }
fn default_mem_max_bytes() -> u64 { 1024 * 1024 * 1024 }
fn default_revive_fraction() -> f64 { 1.0 / 3.0 }
fn default_page() -> usize { 10 }
fn default_service() -> String { "queryzilla-shard".to_string() }

impl ShardConfig {
    pub fn from_env() -> Self {
        let addr = std::env::var("QZ_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
        let index_path = std::env::var("QZ_INDEX").ok();
        let idle_timeout_ms = env_parse("QZ_IDLE_TIMEOUT_MS", default_idle_timeout_ms());
        let max_cursors = env_parse("QZ_MAX_CURSORS", default_max_cursors());
        let mem_warn_bytes = env_parse("QZ_MEM_WARN_BYTES", default_mem_warn_bytes());
        let mem_max_bytes = env_parse("QZ_MEM_MAX_BYTES", default_mem_max_bytes());
        let revive_fraction = env_parse("QZ_REVIVE_FRACTION", default_revive_fraction());
        let default_page = env_parse("QZ_PAGE", default_page());
        let service = std::env::var("QZ_SERVICE").unwrap_or_else(|_| default_service());

        Self {
            addr,
            index_path,
            idle_timeout_ms,
            max_cursors,
            mem_warn_bytes,
            mem_max_bytes,
            revive_fraction,
            default_page,
            service,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, def: T) -> T {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(def)
}
