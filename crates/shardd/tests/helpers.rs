// path: crates/shardd/tests/helpers.rs
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use queryzilla_shard::memindex::MemIndex;
use shardd::clock::ManualClock;
use shardd::config::ShardConfig;
use shardd::http::{router, AppState};
use shardd::memory::StaticMemProbe;
use shardd::registry::{CursorRegistry, RegistryConfig};

/// 20 документов "shared text item N" — expr=text находит все,
/// expr="item N" — ровно один.
pub fn fixture_index() -> MemIndex {
    let mut idx = MemIndex::new("mem://fixture");
    for i in 0..20 {
        let mut meta = BTreeMap::new();
        meta.insert("_id".to_string(), format!("doc-{i}"));
        idx.insert(&format!("shared text item {i}"), meta);
    }
    idx
}

pub struct TestRegistry {
    pub registry: Arc<CursorRegistry>,
    pub clock: Arc<ManualClock>,
    pub mem: Arc<StaticMemProbe>,
}

/// idle 30s, warn 800 / max 1000 байт «памяти» — admission-пороги
/// управляются через StaticMemProbe.
pub fn registry_cfg(max_cursors: usize) -> RegistryConfig {
    RegistryConfig {
        idle_timeout: Duration::from_secs(30),
        max_cursors,
        mem_warn_bytes: 800,
        mem_max_bytes: 1000,
        revive_fraction: 1.0 / 3.0,
    }
}

pub fn make_registry(cfg: RegistryConfig) -> TestRegistry {
    let clock = ManualClock::new();
    let mem = Arc::new(StaticMemProbe::new(0));
    let registry = Arc::new(
        CursorRegistry::new(cfg, Arc::new(fixture_index()))
            .with_clock(clock.clone())
            .with_mem_probe(mem.clone()),
    );
    TestRegistry {
        registry,
        clock,
        mem,
    }
}

pub fn shard_config(max_cursors: usize) -> ShardConfig {
    ShardConfig {
        addr: "127.0.0.1:0".to_string(),
        index_path: None,
        idle_timeout_ms: 30_000,
        max_cursors,
        mem_warn_bytes: 0,
        mem_max_bytes: 0,
        revive_fraction: 1.0 / 3.0,
        default_page: 5,
        service: "queryzilla-shard-test".to_string(),
    }
}

pub fn make_router(max_cursors: usize) -> Router {
    let cfg = shard_config(max_cursors);
    let registry = Arc::new(CursorRegistry::new(
        RegistryConfig::from_shard(&cfg),
        Arc::new(fixture_index()),
    ));
    router(AppState { registry, cfg })
}
