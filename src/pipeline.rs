use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::classifier;
use crate::models::SwapEvent;
use crate::rpc::TransactionFetcher;

/// Glue between the log stream and the output sink: fetch the transaction
/// behind a signature, classify it, emit the event.
///
/// Every failure in here is logged and swallowed; nothing on this path is
/// allowed to take the connection down.
pub struct EventPipeline {
    fetcher: TransactionFetcher,
    events: mpsc::Sender<SwapEvent>,
}

impl EventPipeline {
    pub fn new(fetcher: TransactionFetcher, events: mpsc::Sender<SwapEvent>) -> Self {
        Self { fetcher, events }
    }

    /// Process one notification to completion. Runs at most once at a time;
    /// the caller does not read the next frame until this returns.
    pub async fn handle_signature(&self, signature: &str) {
        let meta = match self.fetcher.fetch(signature).await {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                debug!("No inner instructions in {}, skipping", signature);
                return;
            }
            Err(e) => {
                warn!("Lookup failed for {}: {}", signature, e);
                return;
            }
        };

        match classifier::classify(signature, &meta) {
            Ok(Some(event)) => {
                // the sink owns the one visible record per swap
                debug!("💱 {}", event);
                if self.events.send(event).await.is_err() {
                    error!("Event sink closed, dropping event for {}", signature);
                }
            }
            Ok(None) => debug!("No token balances in {}, not a swap", signature),
            Err(e) => warn!("Dropping event for {}: {}", signature, e),
        }
    }
}
