pub mod memindex;
pub mod normalizer;
pub mod wire;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Флаги материализации документа: какие части шард кладёт в ответ.
/// Передаются битовой маской в параметре `contents`.
pub mod content {
    pub const TEXT: u32 = 1 << 0;
    pub const METADATA: u32 = 1 << 1;
    pub const TERMS: u32 = 1 << 2;
    pub const MATCHES: u32 = 1 << 3;
    pub const ALL: u32 = TEXT | METADATA | TERMS | MATCHES;
}

/// Диапазон совпадения внутри текста документа (байтовые оффсеты).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

/// Витрина документа в ответе шарда. Все части опциональны —
/// что именно заполнено, решает маска `contents` запроса.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// term -> частота, порядок не фиксирован
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub terms: HashMap<String, u64>,
    /// упорядоченные диапазоны совпадений
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Span>,
}

/// Итератор результата одного запроса к шардовому индексу.
/// `seek(row)` ставит позицию ПЕРЕД `row`: следующий `next()` встанет на неё.
pub trait DocIterator: Send {
    fn total(&self) -> u64;
    fn seek(&mut self, row: u64);
    fn next(&mut self) -> bool;
    fn current(&self) -> Option<Document>;
}

/// Точка расширения: локальный текстовый индекс шарда.
/// Токенизация/скоринг — целиком за реализацией; реестру курсоров
/// нужен только итератор с известным total.
pub trait ShardIndex: Send + Sync {
    fn query(&self, expr: &str, contents: u32) -> Result<Box<dyn DocIterator>>;
    fn doc_count(&self) -> u64;
    fn size_bytes(&self) -> u64;
    fn location(&self) -> &str;
}
