//! Background consumer of cloud-connection-established notifications.
//!
//! The connection manager publishes an [`Identity`] on a broadcast channel
//! whenever a cloud connection becomes available. The listener task turns
//! each notification into a subscription resync spawned on its own task, so
//! a slow or failing resync never holds up the next notification and never
//! reaches the publisher.
//!
//! Stopping ends the loop first and lets in-flight resyncs run to completion
//! within the grace period. Only the resyncs still running after that are
//! cancelled.

use super::SubscriptionSynchronizer;
use edge_hub_models::Identity;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{sleep, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{info, warn};

pub struct CloudConnectionListener {
    shutdown_token: CancellationToken,
    /// Cancels in-flight resyncs once the grace period has expired.
    resync_token: CancellationToken,
    /// In-flight resyncs.
    tracker: TaskTracker,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CloudConnectionListener {
    /// Spawn the listener task. Must be called from within a Tokio runtime.
    pub fn start(
        synchronizer: Arc<SubscriptionSynchronizer>,
        mut events: broadcast::Receiver<Identity>,
    ) -> Self {
        let shutdown_token = CancellationToken::new();
        let resync_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let token = shutdown_token.clone();
        let abort_resyncs = resync_token.clone();
        let resyncs = tracker.clone();
        let handle = tokio::spawn(async move {
            info!("Cloud connection listener started");

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        break;
                    }
                    event = events.recv() => {
                        match event {
                            Ok(identity) => {
                                let synchronizer = Arc::clone(&synchronizer);
                                let abort = abort_resyncs.clone();
                                resyncs.spawn(async move {
                                    tokio::select! {
                                        _ = abort.cancelled() => {}
                                        _ = synchronizer.on_cloud_connection_established(&identity) => {}
                                    }
                                });
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(
                                    skipped,
                                    "Cloud connection listener lagged, some resyncs were skipped"
                                );
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                warn!("Cloud connection notifications closed");
                                break;
                            }
                        }
                    }
                }
            }

            info!("Cloud connection listener stopped");
        });

        Self {
            shutdown_token,
            resync_token,
            tracker,
            task: Mutex::new(Some(handle)),
        }
    }

    /// Stop reacting to notifications and wait for in-flight resyncs.
    ///
    /// The loop and the resyncs each get up to `grace`; whatever is still
    /// running after that is aborted or cancelled. Calling this again is a
    /// no-op.
    pub async fn stop(&self, grace: Duration) {
        self.shutdown_token.cancel();

        if let Some(mut handle) = self.task.lock().await.take() {
            tokio::select! {
                _ = &mut handle => {}
                _ = sleep(grace) => {
                    handle.abort();
                }
            }
        }

        self.tracker.close();
        if timeout(grace, self.tracker.wait()).await.is_err() {
            warn!("Timed out waiting for subscription resyncs to finish, cancelling them");
            self.resync_token.cancel();
            self.tracker.wait().await;
        }
    }
}

impl Drop for CloudConnectionListener {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
        self.resync_token.cancel();
    }
}
