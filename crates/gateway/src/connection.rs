use queryzilla_shard::Document;

/// Клиентский прокси одного шарда: удалённый id курсора плюс локальное
/// зеркало позиции и кэш текущего окна. Окно не перематывается на месте —
/// только перезабор новой страницей.
#[derive(Debug, Default)]
pub struct ShardConnection {
    pub addr: String,
    /// пусто, пока шард не прогрет begin'ом
    pub cursor_id: Option<String>,
    /// последняя отданная локальная строка, -1 — ещё ни одной
    pub row: i64,
    pub window_start: i64,
    pub window: Vec<Document>,
    pub total: u64,
    pub last_error: Option<String>,
}

impl ShardConnection {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            row: -1,
            ..Default::default()
        }
    }

    /// Покрывает ли кэшированное окно локальную строку.
    pub fn covers(&self, row: i64) -> bool {
        !self.window.is_empty()
            && row >= self.window_start
            && row < self.window_start + self.window.len() as i64
    }

    pub fn doc_at(&self, row: i64) -> Option<&Document> {
        if !self.covers(row) {
            return None;
        }
        self.window.get((row - self.window_start) as usize)
    }

    /// Сбрасывает локальное состояние (stale после seek на другой шард
    /// или после ошибки запроса).
    pub fn reset_window(&mut self) {
        self.window.clear();
        self.window_start = 0;
        self.row = -1;
    }
}
