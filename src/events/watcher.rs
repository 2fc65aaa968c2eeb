//! Contract event watching: backfill historical logs, then follow new ones.
//!
//! # Lifecycle
//! ```text
//! LogFilter::new      CREATED      descriptor located, filter built (no RPC)
//!     → start         BACKFILLING  filter installed, history delivered in order
//!     → Subscription  LIVE         background task polls filter changes
//!     → stop          STOPPED      task joined, filter uninstalled
//! ```
//!
//! `stop` consumes the subscription, so a stopped watch cannot be resumed.
//! Dropping a live subscription cancels its task; the node-side filter is
//! then left to expire.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::{Address, U256};
use alloy::rpc::types::Filter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::blockchain::ChainClient;
use crate::events::abi::find_event;
use crate::events::decode::decode_log;
use crate::events::filter::build_filter;
use crate::events::types::{BlockRange, DecodedLog, EventResult, WatchState};
use crate::observability::metrics;

/// Receives decoded logs.
///
/// Live logs are delivered from a background task, so callbacks must be
/// shareable across threads.
pub trait LogCallback: Send + Sync + 'static {
    fn on_log(&self, log: DecodedLog);
}

impl<F> LogCallback for F
where
    F: Fn(DecodedLog) + Send + Sync + 'static,
{
    fn on_log(&self, log: DecodedLog) {
        self(log)
    }
}

/// Callback that logs every event under `name`.
pub fn log_printer(name: impl Into<String>) -> impl LogCallback {
    let name = name.into();
    move |log: DecodedLog| {
        tracing::info!(
            watcher = %name,
            event = %log.event,
            block_number = ?log.log.block_number,
            tx_hash = ?log.log.transaction_hash,
            args = %log.args,
            "Event"
        );
    }
}

/// A watch that has been configured but not started.
#[derive(Debug, Clone)]
pub struct LogFilter {
    event: Event,
    filter: Filter,
}

impl LogFilter {
    /// Locate `event_name` in `abi` and build its filter.
    ///
    /// Fails before any filter exists if the event is missing or ambiguous,
    /// or if an argument constraint is invalid.
    pub fn new(
        abi: &JsonAbi,
        address: Address,
        event_name: &str,
        range: BlockRange,
        args: &BTreeMap<String, String>,
    ) -> EventResult<Self> {
        let event = find_event(abi, event_name)?.clone();
        let filter = build_filter(&event, address, range, args)?;
        Ok(Self { event, filter })
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn state(&self) -> WatchState {
        WatchState::Created
    }

    /// Install the filter, deliver all historical matches to `callback`,
    /// then keep delivering new matches every `poll_interval` until the
    /// returned subscription is stopped.
    ///
    /// Backfill runs on the caller's task and returns only once every
    /// historical log has been delivered.
    pub async fn start<C, F>(
        self,
        client: Arc<C>,
        callback: F,
        poll_interval: Duration,
    ) -> EventResult<Subscription<C>>
    where
        C: ChainClient + 'static,
        F: LogCallback,
    {
        let event_name = self.event.name.clone();
        let filter_id = client.new_filter(&self.filter).await?;
        tracing::debug!(
            event = %event_name,
            filter_id = %filter_id,
            state = ?WatchState::Backfilling,
            "Filter installed"
        );

        let callback = Arc::new(callback);
        let backfilled =
            backfill(client.as_ref(), &self.event, filter_id, callback.as_ref()).await;
        let delivered = match backfilled {
            Ok(delivered) => delivered,
            Err(e) => {
                if let Err(uninstall_err) = client.uninstall_filter(filter_id).await {
                    tracing::warn!(
                        filter_id = %filter_id,
                        error = %uninstall_err,
                        "Failed to release filter after backfill error"
                    );
                }
                return Err(e);
            }
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(poll_changes(
            client.clone(),
            self.event,
            filter_id,
            callback,
            poll_interval,
            cancel_rx,
        ));

        tracing::info!(
            event = %event_name,
            filter_id = %filter_id,
            backfilled = delivered,
            state = ?WatchState::Live,
            "Watching logs"
        );

        Ok(Subscription {
            client,
            event_name,
            filter_id,
            cancel: cancel_tx,
            task,
        })
    }
}

async fn backfill<C, F>(
    client: &C,
    event: &Event,
    filter_id: U256,
    callback: &F,
) -> EventResult<usize>
where
    C: ChainClient + ?Sized,
    F: LogCallback,
{
    let logs = client.get_filter_logs(filter_id).await?;
    let count = logs.len();
    for log in logs {
        let decoded = decode_log(event, log)?;
        metrics::record_log_delivered("backfill");
        callback.on_log(decoded);
    }
    Ok(count)
}

async fn poll_changes<C, F>(
    client: Arc<C>,
    event: Event,
    filter_id: U256,
    callback: Arc<F>,
    poll_interval: Duration,
    mut cancel: watch::Receiver<bool>,
) where
    C: ChainClient + ?Sized,
    F: LogCallback,
{
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Fires on stop and when the handle is dropped
            _ = cancel.changed() => break,
            _ = ticker.tick() => {}
        }

        let logs = match client.get_filter_changes(filter_id).await {
            Ok(logs) => logs,
            Err(e) => {
                tracing::warn!(
                    event = %event.name,
                    filter_id = %filter_id,
                    error = %e,
                    "Polling filter changes failed"
                );
                continue;
            }
        };

        for log in logs {
            if is_cancelled(&cancel) {
                return;
            }
            match decode_log(&event, log) {
                Ok(decoded) => {
                    metrics::record_log_delivered("live");
                    callback.on_log(decoded);
                }
                Err(e) => {
                    tracing::warn!(event = %event.name, error = %e, "Skipping undecodable log");
                }
            }
        }
    }

    tracing::debug!(event = %event.name, filter_id = %filter_id, "Log polling stopped");
}

/// Set by `stop`; a closed channel means the handle was dropped.
fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow() || cancel.has_changed().is_err()
}

/// Handle to a live log watch.
pub struct Subscription<C: ChainClient + 'static> {
    client: Arc<C>,
    event_name: String,
    filter_id: U256,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<C: ChainClient + 'static> Subscription<C> {
    /// Node-side filter id.
    pub fn filter_id(&self) -> U256 {
        self.filter_id
    }

    pub fn state(&self) -> WatchState {
        if self.task.is_finished() {
            WatchState::Stopped
        } else {
            WatchState::Live
        }
    }

    /// Cancel live delivery and release the node-side filter.
    ///
    /// No callback runs once this returns.
    pub async fn stop(self) -> EventResult<()> {
        let _ = self.cancel.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(
                event = %self.event_name,
                error = %e,
                "Log polling task ended abnormally"
            );
        }

        let removed = self.client.uninstall_filter(self.filter_id).await?;
        tracing::info!(
            event = %self.event_name,
            filter_id = %self.filter_id,
            removed,
            state = ?WatchState::Stopped,
            "Stopped watching logs"
        );
        Ok(())
    }
}

impl<C: ChainClient + 'static> std::fmt::Debug for Subscription<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event_name)
            .field("filter_id", &self.filter_id)
            .field("state", &self.state())
            .finish()
    }
}
