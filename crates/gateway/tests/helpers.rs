// path: crates/gateway/tests/helpers.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use gateway::ShardTransport;
use queryzilla_shard::wire::{QueryParams, QueryResponse, StatusBlock};
use queryzilla_shard::Document;

/// Фейковый шард: полный результат + ручки отказов.
#[derive(Debug, Default, Clone)]
pub struct FakeShard {
    pub docs: Vec<Document>,
    /// заявленный total (может расходиться с docs.len() для негативных сценариев)
    pub total: u64,
    /// транспортная ошибка на любой вызов
    pub fail_always: bool,
    /// ответ с error-полем вместо статуса
    pub error_payload: Option<String>,
    /// завышение заявленного size на столько документов
    pub overdeclare: usize,
}

impl FakeShard {
    pub fn with_docs(prefix: &str, n: usize) -> Self {
        let docs = (0..n)
            .map(|i| Document {
                text: Some(format!("{prefix}-{i}")),
                ..Default::default()
            })
            .collect::<Vec<_>>();
        Self {
            total: n as u64,
            docs,
            ..Default::default()
        }
    }
}

/// Транспорт поверх фейковых шардов: журналирует все вызовы и flush'и,
/// раздаёт id вида "cur-N".
pub struct FakeTransport {
    pub shards: Mutex<HashMap<String, FakeShard>>,
    pub calls: Mutex<Vec<(String, QueryParams)>>,
    pub flushed: Mutex<Vec<(String, String)>>,
    next_id: AtomicU64,
}

impl FakeTransport {
    pub fn new(shards: Vec<(&str, FakeShard)>) -> Arc<Self> {
        Arc::new(Self {
            shards: Mutex::new(
                shards
                    .into_iter()
                    .map(|(a, s)| (a.to_string(), s))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
            flushed: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn set_fail(&self, addr: &str, fail: bool) {
        if let Some(s) = self.shards.lock().get_mut(addr) {
            s.fail_always = fail;
        }
    }

    pub fn called_addrs(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(a, _)| a.clone()).collect()
    }
}

#[async_trait]
impl ShardTransport for FakeTransport {
    async fn query(&self, addr: &str, params: &QueryParams) -> Result<QueryResponse> {
        self.calls
            .lock()
            .push((addr.to_string(), params.clone()));

        let shard = match self.shards.lock().get(addr) {
            Some(s) => s.clone(),
            None => bail!("connection refused"),
        };
        if shard.fail_always {
            bail!("connection reset by peer");
        }

        if params.flush.is_some() {
            let id = params.id.clone().unwrap_or_default();
            self.flushed.lock().push((addr.to_string(), id.clone()));
            return Ok(QueryResponse {
                service: "fake".to_string(),
                message: Some(format!("cursor {id} flushed")),
                ..Default::default()
            });
        }

        if let Some(err) = &shard.error_payload {
            return Ok(QueryResponse {
                service: "fake".to_string(),
                error: Some(err.clone()),
                ..Default::default()
            });
        }

        let id = match &params.id {
            Some(id) => id.clone(),
            None => format!("cur-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
        };

        let offset = params.row.filter(|r| *r >= 0).unwrap_or(0) as usize;
        let max = params.max.unwrap_or(10);
        let docs: Vec<Document> = shard
            .docs
            .iter()
            .skip(offset)
            .take(max)
            .cloned()
            .collect();

        let row = if docs.is_empty() {
            offset as i64 - 1
        } else {
            (offset + docs.len()) as i64 - 1
        };
        let declared = docs.len() + shard.overdeclare;

        Ok(QueryResponse {
            service: "fake".to_string(),
            ts: String::new(),
            status: Some(StatusBlock {
                id,
                expr: params.expr.clone().unwrap_or_default(),
                contents: params.contents.unwrap_or(0),
                row,
                size: declared,
                total: shard.total,
                time_ms: 0,
            }),
            docs,
            message: None,
            error: None,
        })
    }
}
