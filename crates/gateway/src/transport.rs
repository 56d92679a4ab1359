use anyhow::Result;
use async_trait::async_trait;

use queryzilla_shard::wire::{QueryParams, QueryResponse};

/// Транспорт одного запроса `/query` к шарду. Трейт — чтобы агрегатный
/// курсор тестировался на фейковых шардах без сети.
#[async_trait]
pub trait ShardTransport: Send + Sync {
    async fn query(&self, addr: &str, params: &QueryParams) -> Result<QueryResponse>;
}

/// HTTP-транспорт поверх reqwest. Параметры уходят query-строкой,
/// отсутствующие — не передаются вовсе (absence != пустая строка).
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShardTransport for HttpTransport {
    async fn query(&self, addr: &str, params: &QueryParams) -> Result<QueryResponse> {
        let url = format!("http://{addr}/query");

        let mut q: Vec<(&str, String)> = Vec::new();
        if let Some(id) = &params.id {
            q.push(("id", id.clone()));
        }
        if let Some(expr) = &params.expr {
            q.push(("expr", expr.clone()));
        }
        if let Some(contents) = params.contents {
            q.push(("contents", contents.to_string()));
        }
        if let Some(row) = params.row {
            q.push(("row", row.to_string()));
        }
        if let Some(max) = params.max {
            q.push(("max", max.to_string()));
        }
        if params.flush.is_some() {
            q.push(("flush", "1".to_string()));
        }

        let resp = self.client.get(&url).query(&q).send().await?;
        Ok(resp.json::<QueryResponse>().await?)
    }
}
