//! Типы протокола `/query`/`/status`/`/close`, общие для сервера и клиента.
//! Кодек — JSON поверх HTTP; имена и кардинальности полей фиксированы,
//! отсутствие параметра отличается от пустой строки (Option).

use serde::{Deserialize, Serialize};

use crate::Document;

/// Параметры запроса `/query`.
/// `id` отсутствует — значит "создать курсор" (тогда обязателен `expr`).
/// `row` отсутствует или отрицателен — продолжить с собственной позиции курсора.
/// `flush` — флаг присутствия: вместе с `id` закрывает курсор вместо пейджинга.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush: Option<String>,
}

/// Хвостовой статус-блок ответа `/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBlock {
    pub id: String,
    pub expr: String,
    pub contents: u32,
    /// последняя отданная строка (-1 — ещё ни одной)
    pub row: i64,
    /// размер только что отданного окна
    pub size: usize,
    pub total: u64,
    pub time_ms: u64,
}

/// Корень ответа `/query`. При отказе вместо `docs`/`status` заполнен
/// ровно один из `message` (admission) или `error` (неизвестный id, сбой).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub service: String,
    pub ts: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Текст отказа, если ответ его несёт (error либо message).
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Параметры `/status`. `detail` — флаг присутствия.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Строка per-cursor в детальном `/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorStatus {
    pub id: String,
    pub expr: String,
    pub state: String,
    pub row: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub idle_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    pub docs: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub service: String,
    pub ts: String,
    pub location: String,
    pub max_cursors: usize,
    pub cursors: usize,
    pub idle_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<CursorStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseResponse {
    pub message: String,
    pub evicted: usize,
}
