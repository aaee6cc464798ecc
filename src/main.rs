mod classifier;
mod config;
mod connection;
mod error;
mod models;
mod pipeline;
mod protocol;
mod rpc;

use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::models::SwapEvent;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Logs to stdout; level from RUST_LOG, default INFO
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Solana wallet tracker starting...");

    let cfg = config::load()?;
    info!("Tracking account: {}", cfg.account);

    let (events_tx, mut events_rx) = mpsc::channel::<SwapEvent>(256);
    let (stop_tx, stop_rx) = watch::channel(false);

    let manager = connection::ConnectionManager::new(&cfg, events_tx, stop_rx)?;
    let mut watcher_handle = tokio::spawn(manager.run());

    // Output sink: one structured line per classified swap
    let sink_handle = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let when = event
                .block_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "unknown time".to_string());
            info!(
                "{} | {} {} of {} for {} SOL at {}",
                event.signature,
                event.action,
                event.token_amount,
                event.token_ca,
                event.sol_amount,
                when
            );
        }
    });

    // Graceful shutdown
    tokio::select! {
        res = &mut watcher_handle => match res {
            Ok(()) => warn!("Watcher exited without a stop request"),
            Err(e) => error!("Watcher task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
            let _ = stop_tx.send(true);
            if let Err(e) = watcher_handle.await {
                error!("Watcher task panicked: {:?}", e);
            }
        }
    }

    // the watcher owns the event sender, so the sink drains and exits here
    let _ = sink_handle.await;
    info!("Solana wallet tracker stopped.");
    Ok(())
}
