//! `hypotenuse`: counter demo for the state store and renderer.
//!
//! Usage:
//!   hypotenuse [--db <path>] [--increments <n>] [--serialize-writes]
//!
//! The count lives under `local.count`, so it survives restarts when the
//! same database file is used.

mod counter;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use hypotenuse_dom::{Document, Renderer, ROOT_ID};
use hypotenuse_flux::{StateStore, StateTree, StoreConfig, WriteMode};
use hypotenuse_kv::{KVStore, RedbStore};
use serde_json::json;
use tracing::info;

use counter::COUNT_PATH;

/// Hypotenuse counter demo.
#[derive(Parser, Debug)]
#[command(name = "hypotenuse", about = "Hypotenuse counter demo")]
struct Cli {
    /// Path to the redb database file.
    #[arg(long = "db")]
    db: Option<PathBuf>,

    /// Number of times to increment the counter.
    #[arg(long = "increments", default_value_t = 3)]
    increments: u64,

    /// Run each write to completion before starting the next.
    #[arg(long = "serialize-writes")]
    serialize_writes: bool,

    /// Storage key for the persistent segment.
    #[arg(long = "storage-key")]
    storage_key: Option<String>,
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig {
            db_path: self.db.clone(),
            ..Default::default()
        };
        if let Some(key) = &self.storage_key {
            config.storage_key = key.clone();
        }
        if self.serialize_writes {
            config.write_mode = WriteMode::Serialized;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.store_config();

    // Initialize storage.
    let db_path = config.resolve_db_path();
    info!("Opening state database at {}", db_path.display());
    let kv: Arc<dyn KVStore> = Arc::new(
        RedbStore::open(&db_path).map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );

    let store = StateStore::initialize(config, kv, StateTree::new(), StateTree::new())?;

    // Render.
    let subscriptions = Arc::new(Mutex::new(Vec::new()));
    let renderer = Renderer::new(Document::new());
    let handle = renderer
        .render_element_as_append(
            counter::counter(store.clone(), subscriptions.clone()),
            &ROOT_ID.into(),
        )
        .await?;
    info!("Counter mounted as '{}'", handle.id());

    for _ in 0..cli.increments {
        let next = store
            .get_state(COUNT_PATH)?
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
            + 1;
        store.set_state(COUNT_PATH, json!(next)).await?;
        info!(
            "count = {} ({})",
            next,
            handle.text_content().unwrap_or_default()
        );
    }

    info!("Document: {}", renderer.document().outer_html());
    info!(
        "Persistent segment: {}",
        serde_json::Value::Object(store.persistent_segment())
    );

    let disposers = std::mem::take(&mut *subscriptions.lock().unwrap());
    for disposer in disposers {
        disposer.dispose();
    }
    info!("{} listeners left", store.listener_count());

    Ok(())
}
