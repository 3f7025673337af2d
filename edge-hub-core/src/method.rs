use edge_hub_error::HubResult;
use edge_hub_models::{
    ConnectionManager, DeviceSubscription, DirectMethodRequest, DirectMethodResponse,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Delivery policy for direct method calls.
///
/// A call is forwarded only when the target is connected *and* has an active
/// `Methods` subscription. Anything else yields a 404 response, not an error.
pub struct MethodInvoker {
    connection_manager: Arc<dyn ConnectionManager>,
}

impl MethodInvoker {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    pub async fn invoke(
        &self,
        target_id: &str,
        request: DirectMethodRequest,
    ) -> HubResult<DirectMethodResponse> {
        // Subscriptions are only looked at once a connection is known to exist.
        let Some(device_proxy) = self.connection_manager.get_device_connection(target_id) else {
            warn!(
                id = %target_id,
                method = %request.name,
                "Unable to invoke method as client is not connected"
            );
            return Ok(DirectMethodResponse::not_found());
        };

        let subscribed = self
            .connection_manager
            .get_subscriptions(target_id)
            .and_then(|s| s.get(&DeviceSubscription::Methods).copied())
            .unwrap_or(false);
        if !subscribed {
            warn!(
                id = %target_id,
                method = %request.name,
                "Unable to invoke method because no subscription for methods was found"
            );
            return Ok(DirectMethodResponse::not_found());
        }

        debug!(
            id = %target_id,
            method = %request.name,
            correlation_id = %request.correlation_id,
            "Invoking method"
        );
        device_proxy.invoke_method(request).await
    }
}
