// Файл: crates/gateway/src/cursor.rs
use std::sync::Arc;
use tracing::warn;

use queryzilla_shard::wire::QueryParams;
use queryzilla_shard::Document;

use crate::connection::ShardConnection;
use crate::error::GatherError;
use crate::transport::ShardTransport;

pub const DEFAULT_PAGE: usize = 32;

/// Агрегатный курсор: один логический результат поверх упорядоченного
/// списка шардов. Слияние конкатенацией — шард вычерпывается целиком,
/// потом следующий в порядке регистрации (не ранговое слияние).
pub struct ScatterGatherCursor {
    transport: Arc<dyn ShardTransport>,
    expr: String,
    contents: u32,
    page_size: usize,
    shards: Vec<ShardConnection>,
    cur: usize,
    global_row: i64,
    global_total: u64,
    closed: bool,
}

impl std::fmt::Debug for ScatterGatherCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatterGatherCursor")
            .field("expr", &self.expr)
            .field("contents", &self.contents)
            .field("page_size", &self.page_size)
            .field("shards", &self.shards)
            .field("cur", &self.cur)
            .field("global_row", &self.global_row)
            .field("global_total", &self.global_total)
            .field("closed", &self.closed)
            .finish()
    }
}

impl ScatterGatherCursor {
    /// Параллельный fan-out: на каждый адрес одна задача с одним «тёплым»
    /// вызовом (create + страница нулевого размера — узнаём id и total).
    /// Ждём ВСЕ задачи независимо от отказов; любые отказы собираются в
    /// одну сводную ошибку, и курсор не создаётся. Своего таймаута на
    /// шард нет — медленный шард держит весь begin до таймаута транспорта.
    pub async fn begin(
        transport: Arc<dyn ShardTransport>,
        addrs: &[String],
        expr: &str,
        contents: u32,
        page_size: usize,
    ) -> Result<Self, GatherError> {
        let mut shards: Vec<ShardConnection> =
            addrs.iter().map(|a| ShardConnection::new(a)).collect();

        let mut handles = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let t = transport.clone();
            let addr = addr.clone();
            let params = QueryParams {
                expr: Some(expr.to_string()),
                contents: Some(contents),
                row: Some(0),
                max: Some(0),
                ..Default::default()
            };
            handles.push(tokio::spawn(async move {
                let out = t.query(&addr, &params).await;
                (addr, out)
            }));
        }

        // счётный join: сперва дожидаемся всех, потом смотрим на ошибки
        let mut failures: Vec<String> = Vec::new();
        for (i, h) in handles.into_iter().enumerate() {
            let (addr, out) = match h.await {
                Ok(v) => v,
                Err(e) => {
                    failures.push(format!("{}: task failed: {e}", shards[i].addr));
                    continue;
                }
            };
            match out {
                Ok(resp) => {
                    if let Some(fail) = resp.failure() {
                        shards[i].last_error = Some(fail.to_string());
                        failures.push(format!("{addr}: {fail}"));
                    } else if let Some(st) = resp.status {
                        shards[i].cursor_id = Some(st.id);
                        shards[i].total = st.total;
                    } else {
                        failures.push(format!("{addr}: malformed response, no status"));
                    }
                }
                Err(e) => {
                    shards[i].last_error = Some(e.to_string());
                    failures.push(format!("{addr}: {e}"));
                }
            }
        }

        if !failures.is_empty() {
            return Err(GatherError::Begin(failures.join("; ")));
        }

        let global_total = shards.iter().map(|s| s.total).sum();
        Ok(Self {
            transport,
            expr: expr.to_string(),
            contents,
            page_size: page_size.max(1),
            shards,
            cur: 0,
            global_row: -1,
            global_total,
            closed: false,
        })
    }

    pub fn global_total(&self) -> u64 {
        self.global_total
    }

    pub fn global_row(&self) -> i64 {
        self.global_row
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn contents(&self) -> u32 {
        self.contents
    }

    /// Шаг вперёд. Быстрый путь — окно текущего шарда уже покрывает
    /// следующую строку; иначе ровно один сетевой вызов на дозабор окна.
    /// Исчерпанный шард — переход к следующему по порядку регистрации.
    pub async fn next(&mut self) -> Result<bool, GatherError> {
        if self.closed || self.global_total == 0 {
            return Ok(false);
        }
        loop {
            if self.cur >= self.shards.len() {
                self.global_row = self.global_total as i64;
                return Ok(false);
            }

            let next_row = self.shards[self.cur].row + 1;
            if next_row >= self.shards[self.cur].total as i64 {
                self.cur += 1;
                continue;
            }

            if self.shards[self.cur].covers(next_row) {
                self.shards[self.cur].row = next_row;
                self.global_row += 1;
                return Ok(true);
            }

            self.fetch_window(self.cur, next_row as u64).await?;
            if self.shards[self.cur].window.is_empty() {
                // заявленный total разошёлся с фактом — не зацикливаемся
                warn!(
                    addr = %self.shards[self.cur].addr,
                    row = next_row,
                    "shard returned empty page before declared total"
                );
                self.cur += 1;
            }
        }
    }

    /// Прямое позиционирование на глобальную строку: префиксные суммы
    /// total'ов дают владеющий шард и локальный оффсет; чужие окна
    /// сбрасываются, владельцу — один вызов страницы.
    pub async fn seek(&mut self, global_row: u64) -> Result<(), GatherError> {
        if self.closed || global_row >= self.global_total {
            return Err(GatherError::InvalidCursorState);
        }

        let mut prefix: u64 = 0;
        let mut owner = None;
        for (i, c) in self.shards.iter().enumerate() {
            if global_row < prefix + c.total {
                owner = Some((i, global_row - prefix));
                break;
            }
            prefix += c.total;
        }
        let (i, local) = owner.ok_or(GatherError::InvalidCursorState)?;

        for (j, c) in self.shards.iter_mut().enumerate() {
            if j != i {
                c.reset_window();
            }
        }

        self.fetch_window(i, local).await?;
        self.shards[i].row = local as i64;
        self.cur = i;
        self.global_row = global_row as i64;
        Ok(())
    }

    /// Документ на текущей позиции.
    pub fn current(&self) -> Result<&Document, GatherError> {
        if self.closed
            || self.global_total == 0
            || self.global_row < 0
            || self.global_row >= self.global_total as i64
            || self.cur >= self.shards.len()
        {
            return Err(GatherError::InvalidCursorState);
        }
        let c = &self.shards[self.cur];
        c.doc_at(c.row).ok_or(GatherError::InvalidCursorState)
    }

    /// Best-effort flush каждого открытого удалённого курсора. Сбои
    /// транспорта здесь только логируются: курсор после close всё равно
    /// непригоден.
    pub async fn close(&mut self) {
        for c in &mut self.shards {
            let Some(id) = c.cursor_id.take() else {
                continue;
            };
            let params = QueryParams {
                id: Some(id),
                flush: Some("1".to_string()),
                ..Default::default()
            };
            if let Err(e) = self.transport.query(&c.addr, &params).await {
                warn!(addr = %c.addr, error = %e, "flush on close failed");
            }
        }
        self.closed = true;
    }

    /// Один дозабор окна шарда `i` начиная с локальной строки `from`.
    /// Ошибка инвалидирует локальное состояние этого шарда (окно и row).
    async fn fetch_window(&mut self, i: usize, from: u64) -> Result<(), GatherError> {
        let addr = self.shards[i].addr.clone();
        let params = QueryParams {
            id: self.shards[i].cursor_id.clone(),
            row: Some(from as i64),
            max: Some(self.page_size),
            ..Default::default()
        };

        let transport = self.transport.clone();
        let resp = match transport.query(&addr, &params).await {
            Ok(r) => r,
            Err(e) => {
                let c = &mut self.shards[i];
                c.reset_window();
                c.last_error = Some(e.to_string());
                return Err(GatherError::Transport {
                    addr,
                    message: e.to_string(),
                });
            }
        };

        if let Some(fail) = resp.failure() {
            let c = &mut self.shards[i];
            c.reset_window();
            c.last_error = Some(fail.to_string());
            return Err(GatherError::Shard {
                addr,
                message: fail.to_string(),
            });
        }

        // клэмп при расхождении заявленного размера с фактом
        if let Some(st) = &resp.status {
            if st.size != resp.docs.len() {
                warn!(
                    addr = %addr,
                    declared = st.size,
                    observed = resp.docs.len(),
                    "page size mismatch, trusting observed count"
                );
            }
        }

        let c = &mut self.shards[i];
        c.window = resp.docs;
        c.window_start = from as i64;
        Ok(())
    }
}
