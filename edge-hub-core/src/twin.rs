use crate::dispatcher::RoutingDispatcher;
use edge_hub_error::HubResult;
use edge_hub_models::{Identity, Message, MessageSource, TwinManager};
use std::sync::Arc;
use tracing::{debug, warn};

/// Bridges twin traffic to the twin manager and the routing engine.
pub struct TwinBridge {
    twin_manager: Arc<dyn TwinManager>,
    dispatcher: Arc<RoutingDispatcher>,
}

impl TwinBridge {
    pub fn new(twin_manager: Arc<dyn TwinManager>, dispatcher: Arc<RoutingDispatcher>) -> Self {
        Self {
            twin_manager,
            dispatcher,
        }
    }

    /// Persist a reported-properties update and route it as a twin change
    /// notification.
    ///
    /// Both effects run concurrently and are always driven to completion. The
    /// call fails if either fails. When both fail the twin manager error is
    /// returned regardless of which failed first, and the routing error is
    /// only logged. Twin traffic is not size checked.
    pub async fn update_reported_properties(
        &self,
        identity: &Identity,
        reported: Message,
    ) -> HubResult<()> {
        debug!(id = %identity, "Reported properties update message received");

        let persist = self
            .twin_manager
            .update_reported_properties(identity.id(), reported.clone());
        let route = self
            .dispatcher
            .dispatch(reported, MessageSource::TwinChangeNotification, false);

        let (persisted, routed) = tokio::join!(persist, route);
        if let (Err(_), Err(e)) = (&persisted, &routed) {
            warn!(id = %identity, error = %e, "Error routing twin change notification");
        }
        persisted.and(routed)
    }

    pub async fn get_twin(&self, id: &str) -> HubResult<Message> {
        debug!(id = %id, "GetTwin call received");
        self.twin_manager.get_twin(id).await
    }

    pub async fn update_desired_properties(
        &self,
        id: &str,
        twin_collection: Message,
    ) -> HubResult<()> {
        debug!(id = %id, "Desired properties update message received");
        self.twin_manager
            .update_desired_properties(id, twin_collection)
            .await
    }
}
