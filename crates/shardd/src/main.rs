// Файл: crates/shardd/src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use queryzilla_shard::memindex::MemIndex;
use queryzilla_shard::ShardIndex;
use shardd::config::ShardConfig;
use shardd::http::{router, AppState};
use shardd::registry::{CursorRegistry, RegistryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = ShardConfig::from_env();

    let index: Arc<dyn ShardIndex> = match &cfg.index_path {
        Some(path) => {
            let idx = MemIndex::load_jsonl(path)?;
            tracing::info!(path = %path, docs = idx.doc_count(), "index loaded");
            Arc::new(idx)
        }
        None => {
            tracing::warn!("QZ_INDEX not set, serving an empty index");
            Arc::new(MemIndex::new("mem://empty"))
        }
    };

    let registry = Arc::new(CursorRegistry::new(
        RegistryConfig::from_shard(&cfg),
        index,
    ));

    let addr: SocketAddr = cfg.addr.parse()?;
    let app = router(AppState {
        registry,
        cfg: cfg.clone(),
    });

    tracing::info!(address = %addr, service = %cfg.service, "shard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
