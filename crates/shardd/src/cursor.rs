// path: crates/shardd/src/cursor.rs
use parking_lot::Mutex;
use std::time::{Duration, Instant};

use queryzilla_shard::wire::CursorStatus;
use queryzilla_shard::{DocIterator, Document, ShardIndex};

/// Состояния серверного курсора. Evicted — это удаление записи из
/// реестра, поэтому отдельного варианта не несёт: неизвестный id и есть
/// терминальное состояние.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Created,
    Active,
    Expired,
}

impl CursorState {
    pub fn as_str(self) -> &'static str {
        match self {
            CursorState::Created => "created",
            CursorState::Active => "active",
            CursorState::Expired => "expired",
        }
    }
}

/// Страница, отданная курсором.
#[derive(Debug)]
pub struct PageOut {
    pub docs: Vec<Document>,
    pub row: i64,
    pub window: usize,
    pub total: u64,
    pub expr: String,
    pub contents: u32,
}

/// Серверный курсор одного выражения. Идентичность (`id`, `expr`,
/// `contents`) неизменна; позиция и итератор — под собственным замком,
/// так что два запроса к одному id упорядочены, а разные курсоры
/// пейджатся параллельно.
pub struct ShardCursor {
    pub id: String,
    pub expr: String,
    pub contents: u32,
    inner: Mutex<CursorInner>,
}

struct CursorInner {
    state: CursorState,
    row: i64, // последняя отданная строка, -1 — ещё ни одной
    window: usize,
    total: Option<u64>, // фиксируется при первой активации
    last_accessed: Instant,
    iter: Option<Box<dyn DocIterator>>,
}

impl ShardCursor {
    pub fn new(id: String, expr: String, contents: u32, now: Instant) -> Self {
        Self {
            id,
            expr,
            contents,
            inner: Mutex::new(CursorInner {
                state: CursorState::Created,
                row: -1,
                window: 0,
                total: None,
                last_accessed: now,
                iter: None,
            }),
        }
    }

    /// Отдаёт окно до `max` документов начиная с `offset` (None —
    /// продолжить с собственной позиции). Гонит Created|Expired -> Active:
    /// при отсутствии итератора открывает новый по тому же выражению.
    /// `total` при revive НЕ пересчитывается.
    pub fn page(
        &self,
        index: &dyn ShardIndex,
        offset: Option<u64>,
        max: usize,
        now: Instant,
    ) -> anyhow::Result<PageOut> {
        let mut g = self.inner.lock();

        if g.iter.is_none() {
            let it = index.query(&self.expr, self.contents)?;
            if g.total.is_none() {
                g.total = Some(it.total());
            }
            g.iter = Some(it);
            g.state = CursorState::Active;
        }
        let total = g.total.unwrap_or(0);

        let target = match offset {
            Some(o) => o,
            None => (g.row + 1).max(0) as u64,
        };

        let mut docs = Vec::new();
        if let Some(it) = g.iter.as_mut() {
            it.seek(target);
            while docs.len() < max && it.next() {
                match it.current() {
                    Some(d) => docs.push(d),
                    None => break,
                }
            }
        }

        g.window = docs.len();
        g.row = if docs.is_empty() {
            target as i64 - 1
        } else {
            target as i64 + docs.len() as i64 - 1
        };
        g.last_accessed = now;

        Ok(PageOut {
            row: g.row,
            window: g.window,
            total,
            expr: self.expr.clone(),
            contents: self.contents,
            docs,
        })
    }

    /// Active -> Expired при простое дольше idle_timeout; итератор
    /// освобождается сразу, позиция и total остаются для revive.
    /// Возвращает состояние и last_accessed для eviction-сортировки.
    pub(crate) fn sweep_state(&self, now: Instant, idle_timeout: Duration) -> (CursorState, Instant) {
        let mut g = self.inner.lock();
        if g.state == CursorState::Active
            && now.saturating_duration_since(g.last_accessed) > idle_timeout
        {
            g.state = CursorState::Expired;
            g.iter = None;
        }
        (g.state, g.last_accessed)
    }

    pub fn state(&self) -> CursorState {
        self.inner.lock().state
    }

    pub fn has_iter(&self) -> bool {
        self.inner.lock().iter.is_some()
    }

    pub fn total(&self) -> Option<u64> {
        self.inner.lock().total
    }

    pub(crate) fn snapshot(&self, now: Instant) -> CursorStatus {
        let g = self.inner.lock();
        CursorStatus {
            id: self.id.clone(),
            expr: self.expr.clone(),
            state: g.state.as_str().to_string(),
            row: g.row,
            total: g.total,
            idle_ms: now.saturating_duration_since(g.last_accessed).as_millis() as u64,
        }
    }
}
