// path: crates/shardd/src/registry.rs
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ShardConfig;
use crate::cursor::{CursorState, PageOut, ShardCursor};
use crate::memory::{MemProbe, ProcMemProbe};
use queryzilla_shard::wire::CursorStatus;
use queryzilla_shard::ShardIndex;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Превышен потолок памяти или числа курсоров — не сбой сервиса,
    /// клиенту уходит message.
    #[error("cursor admission rejected: {0}")]
    AdmissionRejected(String),
    #[error("unknown cursor id: {0}")]
    CursorNotFound(String),
    #[error(transparent)]
    Index(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub idle_timeout: Duration,
    pub max_cursors: usize,
    pub mem_warn_bytes: u64,
    pub mem_max_bytes: u64,
    pub revive_fraction: f64,
}

impl RegistryConfig {
    pub fn from_shard(cfg: &ShardConfig) -> Self {
        Self {
            idle_timeout: cfg.idle_timeout(),
            max_cursors: cfg.max_cursors,
            mem_warn_bytes: cfg.mem_warn_bytes,
            mem_max_bytes: cfg.mem_max_bytes,
            revive_fraction: cfg.revive_fraction,
        }
    }

    /// Сколько Expired-курсоров остаётся жить после eviction-свипа —
    /// «полоса revive», откуда клиент дёшево возвращает курсор в Active.
    pub fn revive_keep(&self) -> usize {
        (self.max_cursors as f64 * self.revive_fraction).ceil() as usize
    }
}

/// Реестр курсоров одного шард-процесса: admission на входе, свип
/// expiration/eviction на каждом запросе. Мутации карты — под одним
/// замком реестра; работа итератора — под замком курсора (cursor.rs).
pub struct CursorRegistry {
    cfg: RegistryConfig,
    index: Arc<dyn ShardIndex>,
    cursors: Mutex<HashMap<String, Arc<ShardCursor>>>,
    next_id: AtomicU64, // монотонный, id не переиспользуются
    clock: Arc<dyn Clock>,
    mem: Arc<dyn MemProbe>,
}

impl CursorRegistry {
    pub fn new(cfg: RegistryConfig, index: Arc<dyn ShardIndex>) -> Self {
        Self {
            cfg,
            index,
            cursors: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            clock: Arc::new(SystemClock),
            mem: Arc::new(ProcMemProbe),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_mem_probe(mut self, mem: Arc<dyn MemProbe>) -> Self {
        self.mem = mem;
        self
    }

    /// Создаёт Created-курсор. Память проверяется независимо от счётчика
    /// курсоров и наоборот; предупредительная зона только логируется.
    pub fn create(&self, expr: &str, contents: u32) -> Result<String, RegistryError> {
        let rss = self.mem.rss_bytes();
        if self.cfg.mem_max_bytes > 0 && rss >= self.cfg.mem_max_bytes {
            return Err(RegistryError::AdmissionRejected(format!(
                "memory {} bytes >= ceiling {}",
                rss, self.cfg.mem_max_bytes
            )));
        }

        let mut map = self.cursors.lock();
        if map.len() >= self.cfg.max_cursors {
            return Err(RegistryError::AdmissionRejected(format!(
                "cursor count {} >= limit {}",
                map.len(),
                self.cfg.max_cursors
            )));
        }
        if self.cfg.mem_warn_bytes > 0 && rss >= self.cfg.mem_warn_bytes {
            warn!(rss, ceiling = self.cfg.mem_max_bytes, "memory pressure, still admitting");
        }

        let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        let cur = Arc::new(ShardCursor::new(
            id.clone(),
            expr.to_string(),
            contents,
            self.clock.now(),
        ));
        map.insert(id.clone(), cur);
        debug!(%id, expr, "cursor created");
        Ok(id)
    }

    /// Страница по id. Короткая ссылка на курсор берётся под замком
    /// реестра, сама работа — уже без него.
    pub fn page(
        &self,
        id: &str,
        offset: Option<u64>,
        max: usize,
    ) -> Result<PageOut, RegistryError> {
        let cur = self
            .cursors
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::CursorNotFound(id.to_string()))?;
        Ok(cur.page(self.index.as_ref(), offset, max, self.clock.now())?)
    }

    /// Безусловное удаление; идемпотентно.
    pub fn flush(&self, id: &str) -> bool {
        let removed = self.cursors.lock().remove(id).is_some();
        if removed {
            debug!(%id, "cursor flushed");
        }
        removed
    }

    /// Оппортунистический свип: сперва Active -> Expired по idle_timeout,
    /// затем eviction Expired от самых старых, пока их не останется
    /// ceil(max_cursors * revive_fraction). Active/Created не трогаем.
    pub fn sweep(&self) {
        let now = self.clock.now();
        let mut map = self.cursors.lock();

        let mut expired = Vec::new();
        for (id, cur) in map.iter() {
            let (state, last) = cur.sweep_state(now, self.cfg.idle_timeout);
            if state == CursorState::Expired {
                expired.push((id.clone(), last));
            }
        }

        let keep = self.cfg.revive_keep();
        if expired.len() > keep {
            expired.sort_by_key(|(_, last)| *last);
            let n_evict = expired.len() - keep;
            for (id, _) in expired.into_iter().take(n_evict) {
                map.remove(&id);
                debug!(%id, "expired cursor evicted");
            }
        }
    }

    /// Для `/close`: выселить всё.
    pub fn close_all(&self) -> usize {
        let mut map = self.cursors.lock();
        let n = map.len();
        map.clear();
        n
    }

    pub fn live_count(&self) -> usize {
        self.cursors.lock().len()
    }

    /// Открытые итераторы (наблюдаемость освобождения ресурсов).
    pub fn open_iterators(&self) -> usize {
        self.cursors
            .lock()
            .values()
            .filter(|c| c.has_iter())
            .count()
    }

    pub fn statuses(&self) -> Vec<CursorStatus> {
        let now = self.clock.now();
        let mut out: Vec<CursorStatus> = self
            .cursors
            .lock()
            .values()
            .map(|c| c.snapshot(now))
            .collect();
        // стабильный порядок для детального /status
        out.sort_by(|a, b| {
            a.id
                .parse::<u64>()
                .unwrap_or(0)
                .cmp(&b.id.parse::<u64>().unwrap_or(0))
        });
        out
    }

    pub fn index(&self) -> &Arc<dyn ShardIndex> {
        &self.index
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }
}
