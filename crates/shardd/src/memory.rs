use std::sync::atomic::{AtomicU64, Ordering};

/// Показания памяти процесса для admission control.
/// Трейт — чтобы в тестах подставлять фиксированные значения.
pub trait MemProbe: Send + Sync {
    fn rss_bytes(&self) -> u64;
}

/// RSS из /proc/self/statm (второе поле, в страницах по 4К).
/// Вне Linux вернёт 0 — admission по памяти фактически выключен.
pub struct ProcMemProbe;

impl MemProbe for ProcMemProbe {
    fn rss_bytes(&self) -> u64 {
        std::fs::read_to_string("/proc/self/statm")
            .ok()
            .and_then(|s| {
                s.split_whitespace()
                    .nth(1)
                    .and_then(|f| f.parse::<u64>().ok())
            })
            .map(|pages| pages * 4096)
            .unwrap_or(0)
    }
}

/// Фиксированный источник: для тестов и сред без /proc.
pub struct StaticMemProbe {
    bytes: AtomicU64,
}

impl StaticMemProbe {
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: AtomicU64::new(bytes),
        }
    }

    pub fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::Relaxed);
    }
}

impl MemProbe for StaticMemProbe {
    fn rss_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
