// path: crates/shardd/src/http.rs
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::ShardConfig;
use crate::registry::{CursorRegistry, RegistryError};
use queryzilla_shard::wire::{
    CloseResponse, IndexStats, QueryParams, QueryResponse, StatusBlock, StatusParams,
    StatusResponse,
};
use queryzilla_shard::content;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CursorRegistry>,
    pub cfg: ShardConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", get(query_handler))
        .route("/status", get(status_handler))
        .route("/close", get(close_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Один запрос — одна операция реестра: create (нет id), page, либо
/// flush (флаг присутствия). Ошибки реестра не роняют процесс — уходят
/// полем error/message в корне ответа.
async fn query_handler(
    State(st): State<AppState>,
    Query(p): Query<QueryParams>,
) -> Json<QueryResponse> {
    let started = Instant::now();
    st.registry.sweep();

    if p.flush.is_some() {
        let Some(id) = p.id else {
            return Json(error_response(&st.cfg, "flush requires id"));
        };
        st.registry.flush(&id);
        return Json(message_response(&st.cfg, &format!("cursor {id} flushed")));
    }

    let id = match p.id {
        Some(id) => id,
        None => {
            let expr = match p.expr.as_deref() {
                Some(e) if !e.is_empty() => e,
                _ => return Json(error_response(&st.cfg, "expr is required to create a cursor")),
            };
            match st
                .registry
                .create(expr, p.contents.unwrap_or(content::ALL))
            {
                Ok(id) => id,
                Err(e @ RegistryError::AdmissionRejected(_)) => {
                    return Json(message_response(&st.cfg, &e.to_string()))
                }
                Err(e) => return Json(error_response(&st.cfg, &e.to_string())),
            }
        }
    };

    // row < 0 или отсутствует — продолжить с позиции курсора
    let offset = p.row.and_then(|r| u64::try_from(r).ok());
    let max = p.max.unwrap_or(st.cfg.default_page);

    match st.registry.page(&id, offset, max) {
        Ok(out) => {
            debug!(%id, row = out.row, size = out.window, total = out.total, "page served");
            Json(QueryResponse {
                service: st.cfg.service.clone(),
                ts: now_ts(),
                docs: out.docs,
                status: Some(StatusBlock {
                    id,
                    expr: out.expr,
                    contents: out.contents,
                    row: out.row,
                    size: out.window,
                    total: out.total,
                    time_ms: started.elapsed().as_millis() as u64,
                }),
                message: None,
                error: None,
            })
        }
        Err(e) => Json(error_response(&st.cfg, &e.to_string())),
    }
}

async fn status_handler(
    State(st): State<AppState>,
    Query(p): Query<StatusParams>,
) -> Json<StatusResponse> {
    st.registry.sweep();

    let index = st.registry.index();
    let detailed = p.detail.is_some();
    Json(StatusResponse {
        service: st.cfg.service.clone(),
        ts: now_ts(),
        location: index.location().to_string(),
        max_cursors: st.registry.config().max_cursors,
        cursors: st.registry.live_count(),
        idle_timeout_ms: st.registry.config().idle_timeout.as_millis() as u64,
        detail: if detailed {
            st.registry.statuses()
        } else {
            Vec::new()
        },
        index: detailed.then(|| IndexStats {
            docs: index.doc_count(),
            bytes: index.size_bytes(),
        }),
    })
}

async fn close_handler(State(st): State<AppState>) -> Json<CloseResponse> {
    let evicted = st.registry.close_all();
    Json(CloseResponse {
        message: "all cursors closed".to_string(),
        evicted,
    })
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn error_response(cfg: &ShardConfig, msg: &str) -> QueryResponse {
    QueryResponse {
        service: cfg.service.clone(),
        ts: now_ts(),
        error: Some(msg.to_string()),
        ..Default::default()
    }
}

fn message_response(cfg: &ShardConfig, msg: &str) -> QueryResponse {
    QueryResponse {
        service: cfg.service.clone(),
        ts: now_ts(),
        message: Some(msg.to_string()),
        ..Default::default()
    }
}
