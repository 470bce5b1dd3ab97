//! Announcement daemon: JSON lines on stdin in, speech out.
//!
//! Each non-blank stdin line is treated as one delivered transport payload.
//! Whatever subscribes to the actual broker pipes messages in here.

use anyhow::Context;
use bytes::Bytes;
use herald::cache::{CacheBackend, CacheStore, DiskCache, HttpCache, MemoryCache};
use herald::gateway::{HttpSynthesizer, SynthesisGateway};
use herald::playback::{CommandPlayer, NullSink, PlaybackSink};
use herald::{HeraldConfig, Ingress, Pipeline};
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald=info,heraldd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HeraldConfig::from_env().context("loading configuration")?;
    info!(cache_dir = %config.cache_dir.display(), "starting heraldd");

    let durable = DiskCache::new(&config.cache_dir)
        .await
        .context("opening durable cache")?;
    let mut store = CacheStore::new(Arc::new(durable));
    if let Some(url) = &config.fast_tier_url {
        info!(url = %url, "fast tier enabled");
        let fast = HttpCache::new(url.clone()).context("building fast tier client")?;
        store = store.with_fast_tier(Arc::new(fast));
    } else if config.memory_cache_entries > 0 {
        info!(entries = config.memory_cache_entries, "in-process fast tier enabled");
        let memory: Arc<dyn CacheBackend> =
            Arc::new(MemoryCache::new(config.memory_cache_entries));
        store = store.with_fast_tier(memory);
    }
    let store = Arc::new(store);

    let mut synthesizer = HttpSynthesizer::builder()
        .endpoint(config.synthesis_url.as_str())
        .timeout_secs(config.request_timeout_secs)
        .retry_policy(config.retry_policy());
    if let Some(key) = &config.synthesis_api_key {
        synthesizer = synthesizer.api_key(key);
    } else {
        warn!("no synthesis API key configured");
    }
    let gateway: Arc<dyn SynthesisGateway> =
        Arc::new(synthesizer.build().context("building synthesis gateway")?);

    let sink: Arc<dyn PlaybackSink> = match config.player_command.split_first() {
        Some((program, args)) => {
            let mut player = CommandPlayer::new(program).with_args(args.iter().cloned());
            if let Some(flag) = &config.volume_flag {
                player = player.with_volume_flag(flag);
            }
            if let Some(chime) = &config.chime_path {
                player = player.with_chime(chime);
            }
            Arc::new(player)
        }
        None => {
            warn!("no player command configured, playback disabled");
            Arc::new(NullSink)
        }
    };

    let pipeline = Pipeline::new(Arc::clone(&store), gateway, sink)
        .with_defaults(config.synthesis_defaults());
    let ingress = Ingress::new(Arc::new(pipeline));

    let (tx, rx) = mpsc::channel::<Bytes>(64);
    let ingress_task = tokio::spawn(ingress.run(rx));
    let mut stdin_task = tokio::spawn(forward_stdin(tx));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            stdin_task.abort();
        }
        _ = &mut stdin_task => {
            info!("input stream closed");
        }
    }

    // Channel sender is gone now; the ingress drains in-flight work and exits.
    ingress_task.await.context("ingress task failed")?;
    info!(stats = ?store.stats(), "final cache statistics");
    Ok(())
}

async fn forward_stdin(tx: mpsc::Sender<Bytes>) {
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(Bytes::from(line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "reading stdin failed");
                break;
            }
        }
    }
}
