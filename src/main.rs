//! Policy Cache watch - prints the live contents of a policy-driven cache
//!
//! Builds an engine over process memory or a Redis hash with a
//! timestamp-keyed policy: every poll injects a record keyed by the current
//! second, and records older than `MAX_AGE_SECS` are evicted on read.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use policy_cache::cache::Storage;
use policy_cache::config::{BackendKind, Config};
use policy_cache::{
    Batch, CacheEngine, CacheError, CacheKey, KeyHint, Policy, PolicyCache, Record, Snapshot,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// == Demo Record ==
#[derive(Debug, Clone, Serialize)]
struct TimestampRecord {
    key: String,
    date: String,
}

// == Timestamp Policy ==
/// Keys records by their timestamp and evicts them once they are older than
/// `max_age`.
struct TimestampPolicy {
    max_age: TimeDelta,
}

impl Policy<TimestampRecord> for TimestampPolicy {
    fn key_of(&self, _hint: KeyHint<'_>, payload: &TimestampRecord) -> policy_cache::Result<CacheKey> {
        if payload.key.is_empty() {
            return Err(CacheError::key_derivation("record has no timestamp key"));
        }
        Ok(CacheKey::from(payload.key.as_str()))
    }

    fn should_evict(&self, key: &CacheKey, _record: Record<'_, TimestampRecord>) -> bool {
        let stamp = NaiveDateTime::parse_from_str(key.as_str(), TIMESTAMP_FORMAT)
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).single());
        match stamp {
            Some(stamp) => stamp + self.max_age < Local::now(),
            None => {
                warn!("Key {} is not a timestamp, evicting", key);
                true
            }
        }
    }

    fn diff_on_poll(&self, snapshot: Snapshot<'_, TimestampRecord>) -> Batch<TimestampRecord> {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        if snapshot.contains_key(&now) {
            return Batch::empty();
        }
        let record = TimestampRecord {
            key: now.clone(),
            date: now.clone(),
        };
        Batch::keyed([(now, record)])
    }
}

/// Entry point for the watch binary.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the engine on the configured backend
/// 4. Read the live snapshot every poll interval until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={}, hash_key={}, poll_interval={}ms, max_age={}s",
        config.backend, config.hash_key, config.poll_interval_ms, config.max_age_secs
    );

    let policy = Arc::new(TimestampPolicy {
        max_age: TimeDelta::seconds(config.max_age_secs as i64),
    });
    let period = Duration::from_millis(config.poll_interval_ms);

    match config.backend {
        BackendKind::Memory => {
            let engine = Arc::new(PolicyCache::in_memory(policy));
            watch(engine, period).await
        }
        BackendKind::Redis => {
            let client = redis::Client::open(config.redis_url.as_str())
                .with_context(|| format!("invalid redis url {}", config.redis_url))?;
            let conn = client
                .get_connection()
                .with_context(|| format!("failed to connect to {}", config.redis_url))?;
            info!("Connected to {}", config.redis_url);
            let engine = Arc::new(PolicyCache::shared(policy, conn, config.hash_key.clone()));
            watch(engine, period).await
        }
    }
}

/// Reads the full snapshot every `period`, polling first, until shutdown.
///
/// Engine calls block, so each read runs on the blocking pool.
async fn watch<S>(
    engine: Arc<PolicyCache<S, TimestampPolicy, TimestampRecord>>,
    period: Duration,
) -> anyhow::Result<()>
where
    S: Storage<TimestampRecord> + Send + 'static,
    S::Stored: Send + 'static,
{
    let mut ticker = tokio::time::interval(period);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reader = engine.clone();
                let snapshot = tokio::task::spawn_blocking(move || reader.get_cache_data(false))
                    .await
                    .context("snapshot task failed")?;

                match snapshot {
                    Ok(live) => {
                        let mut keys: Vec<&str> = live.keys().map(CacheKey::as_str).collect();
                        keys.sort_unstable();
                        info!("Live entries ({}): {:?}", keys.len(), keys);
                    }
                    Err(e) => error!("Failed to read cache snapshot: {}", e),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    info!("Final stats: {:?}", engine.stats());
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
