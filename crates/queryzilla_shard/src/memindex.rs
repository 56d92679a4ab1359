// Файл: crates/queryzilla_shard/src/memindex.rs
use anyhow::{bail, Context, Result};
use croaring::Bitmap;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use crate::normalizer::{normalize, tokens};
use crate::{content, DocIterator, Document, ShardIndex, Span};

/// Эталонная in-memory реализация границы `ShardIndex`:
/// - постинги term -> Bitmap doc_id (prefilter по AND полных токенов);
/// - верификация wildcard-выражения (`*`/`?`) регэкспом по тексту;
/// - текст хранится уже нормализованным, metadata — как пришла.
pub struct MemIndex {
    docs: Arc<Vec<StoredDoc>>,
    postings: HashMap<String, Bitmap>,
    location: String,
}

#[derive(Debug, Clone)]
struct StoredDoc {
    text: String, // нормализованный
    metadata: BTreeMap<String, String>,
}

impl MemIndex {
    pub fn new(location: &str) -> Self {
        Self {
            docs: Arc::new(Vec::new()),
            postings: HashMap::new(),
            location: location.to_string(),
        }
    }

    /// Грузит документы из JSONL: по одному JSON-объекту на строку,
    /// поле "text" — тело, остальные строковые поля уходят в metadata.
    pub fn load_jsonl(path: &str) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("open index input {path}"))?;
        let br = BufReader::new(f);

        let mut idx = Self::new(path);
        for line in br.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let v: serde_json::Value = serde_json::from_str(&line)?;

            let text = v.get("text").and_then(|x| x.as_str()).unwrap_or("");
            let mut metadata = BTreeMap::new();
            if let Some(obj) = v.as_object() {
                for (k, val) in obj {
                    if k == "text" {
                        continue;
                    }
                    if let Some(s) = val.as_str() {
                        metadata.insert(k.clone(), s.to_string());
                    }
                }
            }
            idx.insert(text, metadata);
        }
        Ok(idx)
    }

    pub fn insert(&mut self, text: &str, metadata: BTreeMap<String, String>) -> u32 {
        let doc_id = self.docs.len() as u32;
        let norm = normalize(text);
        for t in tokens(&norm) {
            self.postings.entry(t).or_insert_with(Bitmap::new).add(doc_id);
        }
        Arc::make_mut(&mut self.docs).push(StoredDoc {
            text: norm,
            metadata,
        });
        doc_id
    }

    /// AND постингов по полным токенам выражения; токены с wildcard
    /// участвуют только в верификации. Нет полных токенов — весь индекс.
    fn prefilter(&self, nq: &str) -> Bitmap {
        let mut acc: Option<Bitmap> = None;
        for raw in nq.split_whitespace() {
            if raw.contains('*') || raw.contains('?') {
                continue;
            }
            for t in tokens(raw) {
                let bm = self.postings.get(&t).cloned().unwrap_or_else(Bitmap::new);
                acc = Some(match acc {
                    Some(mut a) => {
                        a.and_inplace(&bm);
                        a
                    }
                    None => bm,
                });
            }
        }
        match acc {
            Some(a) => a,
            None => {
                let mut all = Bitmap::new();
                all.add_range(0..self.docs.len() as u32);
                all
            }
        }
    }
}

impl ShardIndex for MemIndex {
    fn query(&self, expr: &str, contents: u32) -> Result<Box<dyn DocIterator>> {
        let nq = normalize(expr.trim());
        if nq.is_empty() {
            bail!("empty expression");
        }
        let rx = wildcard_to_regex(&nq)?;

        let mut hits: Vec<u32> = Vec::new();
        for doc_id in self.prefilter(&nq).iter() {
            if rx.is_match(&self.docs[doc_id as usize].text) {
                hits.push(doc_id);
            }
        }

        Ok(Box::new(MemIterator {
            docs: self.docs.clone(),
            hits,
            pos: -1,
            rx,
            contents,
        }))
    }

    fn doc_count(&self) -> u64 {
        self.docs.len() as u64
    }

    fn size_bytes(&self) -> u64 {
        let docs: u64 = self
            .docs
            .iter()
            .map(|d| {
                d.text.len() as u64
                    + d.metadata
                        .iter()
                        .map(|(k, v)| (k.len() + v.len()) as u64)
                        .sum::<u64>()
            })
            .sum();
        let postings: u64 = self
            .postings
            .iter()
            .map(|(k, bm)| k.len() as u64 + bm.cardinality() * 4)
            .sum();
        docs + postings
    }

    fn location(&self) -> &str {
        &self.location
    }
}

struct MemIterator {
    docs: Arc<Vec<StoredDoc>>,
    hits: Vec<u32>,
    pos: i64, // -1 перед первой строкой
    rx: Regex,
    contents: u32,
}

impl DocIterator for MemIterator {
    fn total(&self) -> u64 {
        self.hits.len() as u64
    }

    fn seek(&mut self, row: u64) {
        self.pos = row as i64 - 1;
    }

    fn next(&mut self) -> bool {
        if self.pos + 1 < self.hits.len() as i64 {
            self.pos += 1;
            true
        } else {
            self.pos = self.hits.len() as i64;
            false
        }
    }

    fn current(&self) -> Option<Document> {
        if self.pos < 0 || self.pos >= self.hits.len() as i64 {
            return None;
        }
        let d = &self.docs[self.hits[self.pos as usize] as usize];

        let mut out = Document::default();
        if self.contents & content::TEXT != 0 {
            out.text = Some(d.text.clone());
        }
        if self.contents & content::METADATA != 0 {
            out.metadata = d.metadata.clone();
        }
        if self.contents & content::TERMS != 0 {
            for t in tokens(&d.text) {
                *out.terms.entry(t).or_insert(0) += 1;
            }
        }
        if self.contents & content::MATCHES != 0 {
            out.matches = self
                .rx
                .find_iter(&d.text)
                .map(|m| Span {
                    start: m.start() as u32,
                    end: m.end() as u32,
                })
                .collect();
        }
        Some(out)
    }
}

fn wildcard_to_regex(pat: &str) -> Result<Regex> {
    let mut rx = String::from("(?s)");
    for ch in pat.chars() {
        match ch {
            '*' => rx.push_str(".*"),
            '?' => rx.push('.'),
            c => {
                if "\\.^$|()[]{}+*?".contains(c) {
                    rx.push('\\');
                }
                rx.push(c);
            }
        }
    }
    Ok(Regex::new(&rx)?)
}
