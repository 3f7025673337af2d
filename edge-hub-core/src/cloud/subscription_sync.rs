//! Subscription synchronization between local intent and the cloud connection.
//!
//! The connection manager holds the authoritative per-identity subscription
//! flags. This module records changes there first and then brings the cloud
//! connection in line on a best-effort basis:
//!
//! - `add_subscription` / `remove_subscription` record the new flag
//!   unconditionally and propagate it if a cloud connection exists. Timeouts
//!   are absorbed since the next reconnection replays every flag; any other
//!   failure is returned to the caller.
//! - `on_cloud_connection_established` replays the full subscription map of
//!   an identity. Nobody waits on it, so every failure is logged and absorbed.
//!
//! Every cloud-side effect is idempotent, which is what makes the full replay
//! and racing propagations safe.

use edge_hub_error::{HubError, HubResult};
use edge_hub_models::{CloudProxy, ConnectionManager, DeviceSubscription, Identity};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SubscriptionSynchronizer {
    connection_manager: Arc<dyn ConnectionManager>,
}

impl SubscriptionSynchronizer {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Mark `subscription` active for `id` and propagate it to the cloud.
    pub async fn add_subscription(
        &self,
        id: &str,
        subscription: DeviceSubscription,
    ) -> HubResult<()> {
        debug!(id = %id, subscription = ?subscription, "Adding subscription");
        self.connection_manager.add_subscription(id, subscription);
        self.propagate(id, subscription, true).await
    }

    /// Mark `subscription` inactive for `id` and propagate it to the cloud.
    pub async fn remove_subscription(
        &self,
        id: &str,
        subscription: DeviceSubscription,
    ) -> HubResult<()> {
        debug!(id = %id, subscription = ?subscription, "Removing subscription");
        self.connection_manager.remove_subscription(id, subscription);
        self.propagate(id, subscription, false).await
    }

    /// Replay every recorded subscription flag of `id` onto its cloud
    /// connection.
    ///
    /// A failing kind does not stop the replay of the remaining kinds. The
    /// first failure is returned once all kinds have been attempted.
    pub async fn resync(&self, id: &str) -> HubResult<()> {
        let Some(cloud_proxy) = self.connection_manager.get_cloud_connection(id) else {
            debug!(id = %id, "No cloud connection, skipping subscription resync");
            return Ok(());
        };
        let Some(subscriptions) = self.connection_manager.get_subscriptions(id) else {
            return Ok(());
        };

        let mut first_error = None;
        for (subscription, active) in subscriptions {
            if let Err(e) = apply(cloud_proxy.as_ref(), subscription, active).await {
                warn!(
                    id = %id,
                    subscription = ?subscription,
                    active,
                    error = %e,
                    "Error processing subscription"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Reaction to a cloud connection becoming available for `identity`.
    ///
    /// Never fails: there is no caller to report to.
    pub async fn on_cloud_connection_established(&self, identity: &Identity) {
        info!(id = %identity, "Cloud connection established, resyncing subscriptions");
        if let Err(e) = self.resync(identity.id()).await {
            warn!(id = %identity, error = %e, "Error processing subscriptions");
        }
    }

    async fn propagate(
        &self,
        id: &str,
        subscription: DeviceSubscription,
        active: bool,
    ) -> HubResult<()> {
        if !subscription.affects_cloud() {
            return Ok(());
        }
        let Some(cloud_proxy) = self.connection_manager.get_cloud_connection(id) else {
            return Ok(());
        };

        match apply(cloud_proxy.as_ref(), subscription, active).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_timeout() => {
                warn!(
                    id = %id,
                    subscription = ?subscription,
                    active,
                    error = %e,
                    "Subscription sync timed out, deferring to the next cloud reconnection"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    id = %id,
                    subscription = ?subscription,
                    active,
                    error = %e,
                    "Error synchronizing subscription"
                );
                Err(HubError::SubscriptionSyncFailure {
                    id: id.to_string(),
                    subscription: format!("{:?}", subscription),
                    source: Box::new(e),
                })
            }
        }
    }
}

/// Apply the cloud-side effect of one subscription flag.
async fn apply(
    cloud_proxy: &dyn CloudProxy,
    subscription: DeviceSubscription,
    active: bool,
) -> HubResult<()> {
    match subscription {
        // C2D listening stays on until the connection is torn down.
        DeviceSubscription::C2D => {
            if active {
                cloud_proxy.start_listening();
            }
            Ok(())
        }
        DeviceSubscription::DesiredPropertyUpdates => {
            if active {
                cloud_proxy.setup_desired_property_updates().await
            } else {
                cloud_proxy.remove_desired_property_updates().await
            }
        }
        DeviceSubscription::Methods => {
            if active {
                cloud_proxy.setup_call_method().await
            } else {
                cloud_proxy.remove_call_method().await
            }
        }
        DeviceSubscription::ModuleMessages
        | DeviceSubscription::TwinResponse
        | DeviceSubscription::Unknown => Ok(()),
    }
}
