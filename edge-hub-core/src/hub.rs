//! Edge hub facade.
//!
//! `EdgeHub` is the single entry point used by the device/module facing
//! protocol layers. It composes message processing, routing, method
//! invocation, twin bridging and subscription synchronization, and owns the
//! routing engine for its whole lifetime.

use crate::{
    cloud::{CloudConnectionListener, SubscriptionSynchronizer},
    dispatcher::RoutingDispatcher,
    method::MethodInvoker,
    processor::MessageProcessor,
    twin::TwinBridge,
};
use edge_hub_error::{HubError, HubResult};
use edge_hub_models::{
    settings::Hub, ConnectionManager, DeviceSubscription, DirectMethodRequest,
    DirectMethodResponse, Identity, Message, MessageConverter, MessageSource, RoutingEngine,
    TwinManager,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::{debug, info, instrument, warn};

pub struct EdgeHub {
    edge_device_id: Arc<str>,
    router: Arc<dyn RoutingEngine>,
    connection_manager: Arc<dyn ConnectionManager>,
    dispatcher: Arc<RoutingDispatcher>,
    method_invoker: MethodInvoker,
    twin_bridge: TwinBridge,
    subscriptions: Arc<SubscriptionSynchronizer>,
    cloud_listener: CloudConnectionListener,
    shutdown_timeout: Duration,
    /// Set once the routing engine has been released.
    released: AtomicBool,
}

impl EdgeHub {
    /// Build the hub and start reacting to cloud connection notifications.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        settings: &Hub,
        router: Arc<dyn RoutingEngine>,
        converter: Arc<dyn MessageConverter>,
        connection_manager: Arc<dyn ConnectionManager>,
        twin_manager: Arc<dyn TwinManager>,
    ) -> HubResult<Self> {
        settings.validate()?;

        let edge_device_id: Arc<str> = Arc::from(settings.edge_device_id.as_str());
        let processor = Arc::new(MessageProcessor::new(
            Arc::clone(&edge_device_id),
            settings.max_message_size,
            converter,
        ));
        let dispatcher = Arc::new(RoutingDispatcher::new(Arc::clone(&router), processor));
        let subscriptions = Arc::new(SubscriptionSynchronizer::new(Arc::clone(
            &connection_manager,
        )));
        let cloud_listener = CloudConnectionListener::start(
            Arc::clone(&subscriptions),
            connection_manager.subscribe_cloud_connection_established(),
        );

        info!(edge_device_id = %edge_device_id, "Edge hub created");

        Ok(Self {
            method_invoker: MethodInvoker::new(Arc::clone(&connection_manager)),
            twin_bridge: TwinBridge::new(twin_manager, Arc::clone(&dispatcher)),
            edge_device_id,
            router,
            connection_manager,
            dispatcher,
            subscriptions,
            cloud_listener,
            shutdown_timeout: Duration::from_millis(settings.shutdown_timeout_ms),
            released: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn edge_device_id(&self) -> &str {
        &self.edge_device_id
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Route a telemetry message received from `identity`.
    pub async fn process_device_message(
        &self,
        identity: &Identity,
        message: Message,
    ) -> HubResult<()> {
        debug!(id = %identity, "Received message");
        self.dispatcher
            .dispatch(message, MessageSource::Telemetry, true)
            .await
    }

    /// Route a batch of telemetry messages received from `identity`.
    pub async fn process_device_message_batch(
        &self,
        identity: &Identity,
        messages: Vec<Message>,
    ) -> HubResult<()> {
        debug!(id = %identity, count = messages.len(), "Received message batch");
        self.dispatcher.dispatch_batch(messages).await
    }

    /// Invoke a direct method on behalf of `from_id`.
    ///
    /// The call targets `request.id`. Unreachable targets yield a 404
    /// response.
    pub async fn invoke_method(
        &self,
        from_id: &str,
        request: DirectMethodRequest,
    ) -> HubResult<DirectMethodResponse> {
        debug!(
            from = %from_id,
            to = %request.id,
            correlation_id = %request.correlation_id,
            "Received method invoke call"
        );
        let target_id = request.id.clone();
        self.method_invoker.invoke(&target_id, request).await
    }

    pub async fn update_reported_properties(
        &self,
        identity: &Identity,
        reported: Message,
    ) -> HubResult<()> {
        self.twin_bridge
            .update_reported_properties(identity, reported)
            .await
    }

    /// Push a cloud-to-device message to a connected device.
    ///
    /// Without a device connection the message is dropped and the call still
    /// succeeds.
    pub async fn send_c2d_message(&self, id: &str, message: Message) -> HubResult<()> {
        if id.trim().is_empty() {
            return Err(HubError::InvalidArgument(
                "device id must not be blank".to_string(),
            ));
        }

        match self.connection_manager.get_device_connection(id) {
            Some(device_proxy) => device_proxy.send_c2d_message(message).await,
            None => {
                warn!(
                    id = %id,
                    "Unable to send C2D message as an active device connection was not found"
                );
                Ok(())
            }
        }
    }

    pub async fn get_twin(&self, id: &str) -> HubResult<Message> {
        self.twin_bridge.get_twin(id).await
    }

    pub async fn update_desired_properties(
        &self,
        id: &str,
        twin_collection: Message,
    ) -> HubResult<()> {
        self.twin_bridge
            .update_desired_properties(id, twin_collection)
            .await
    }

    pub async fn add_subscription(
        &self,
        id: &str,
        subscription: DeviceSubscription,
    ) -> HubResult<()> {
        self.subscriptions.add_subscription(id, subscription).await
    }

    pub async fn remove_subscription(
        &self,
        id: &str,
        subscription: DeviceSubscription,
    ) -> HubResult<()> {
        self.subscriptions
            .remove_subscription(id, subscription)
            .await
    }

    /// Stop reacting to cloud connection notifications and release the
    /// routing engine.
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    #[instrument(name = "edge-hub-release", skip_all)]
    pub async fn release(&self) -> HubResult<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            debug!("Edge hub already released");
            return Ok(());
        }

        self.cloud_listener.stop(self.shutdown_timeout).await;
        self.router.release().await?;

        info!("Edge hub released");
        Ok(())
    }
}
