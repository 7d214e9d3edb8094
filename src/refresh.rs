//! Background data refresh system
//!
//! Re-fetches weather for one location on a fixed interval in the background,
//! using tokio channels to communicate updates to the watch view. The task
//! checks a shutdown channel every cycle and stops as soon as it fires or the
//! handle is dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::location::LocationQuery;
use crate::service::{Report, WeatherService};

/// Messages sent from background refresh to the watch view
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// Fresh data for the watched location
    Updated(Report),
    /// An error occurred during refresh
    RefreshError(String),
    /// Refresh started
    RefreshStarted,
    /// Refresh completed
    RefreshCompleted,
}

/// Configuration for the refresh cycle
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refreshes
    pub interval: Duration,
    /// Whether each refresh also fetches the forecast
    pub with_forecast: bool,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            with_forecast: false,
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh system
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Requests an out-of-cycle refresh
    refresh_tx: mpsc::Sender<()>,
    /// Signals shutdown
    shutdown_tx: mpsc::Sender<()>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl RefreshHandle {
    /// Creates a new RefreshHandle and spawns the background refresh task
    ///
    /// The first refresh runs immediately. Must be called from within a tokio
    /// runtime.
    ///
    /// # Arguments
    /// * `service` - Shared, cached weather lookups
    /// * `query` - Location to keep refreshed
    /// * `config` - Refresh interval and options
    pub fn spawn(service: Arc<WeatherService>, query: LocationQuery, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = config.enabled.then(|| {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                tracing::info!(location = %query, interval = ?config.interval, "refresh task started");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {}
                        Some(()) = refresh_rx.recv() => {
                            service.invalidate(&query);
                            interval.reset();
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }

                    if !refresh_once(&service, &query, config.with_forecast, &msg_tx).await {
                        // Receiver is gone; nobody is listening any more
                        break;
                    }
                }

                tracing::info!(location = %query, "refresh task stopped");
            })
        });

        Self {
            receiver: msg_rx,
            refresh_tx,
            shutdown_tx,
            task,
        }
    }

    /// Requests an immediate refresh that bypasses cached data
    pub fn request_refresh(&self) {
        // A refresh already queued covers this one
        let _ = self.refresh_tx.try_send(());
    }

    /// Shuts down the background refresh task and waits for it to stop
    pub async fn shutdown(self) {
        let RefreshHandle {
            receiver,
            shutdown_tx,
            task,
            ..
        } = self;
        // Unblocks a task parked on a full message channel
        drop(receiver);
        let _ = shutdown_tx.send(()).await;
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Whether a background task was started
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

/// Runs one refresh cycle; returns `false` once the receiver has hung up
async fn refresh_once(
    service: &WeatherService,
    query: &LocationQuery,
    with_forecast: bool,
    tx: &mpsc::Sender<RefreshMessage>,
) -> bool {
    if tx.send(RefreshMessage::RefreshStarted).await.is_err() {
        return false;
    }

    let purged = service.purge_expired();
    if purged > 0 {
        tracing::debug!(purged, "dropped stale cache entries");
    }

    let message = match service.report(query, with_forecast).await {
        Ok(report) => RefreshMessage::Updated(report),
        Err(err) => RefreshMessage::RefreshError(err.to_string()),
    };

    tx.send(message).await.is_ok() && tx.send(RefreshMessage::RefreshCompleted).await.is_ok()
}

/// Checks for pending refresh messages without blocking
///
/// # Arguments
/// * `handle` - The RefreshHandle to check
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
