pub mod constants;
pub mod enums;
pub mod identity;
pub mod message;
pub mod settings;

pub use enums::{DeviceSubscription, MessageSource};
pub use identity::Identity;
pub use message::{DirectMethodRequest, DirectMethodResponse, Message, RoutingMessage};

use async_trait::async_trait;
use edge_hub_error::HubResult;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::broadcast;

/// Snapshot of the subscription flags recorded for one identity.
pub type SubscriptionState = HashMap<DeviceSubscription, bool>;

/// Routing engine that matches messages against routes and delivers them to
/// the matched endpoints.
///
/// Retries, if any, are the engine's own business: the hub submits once and
/// relays whatever error comes back.
#[async_trait]
pub trait RoutingEngine: Send + Sync + 'static {
    /// Submit a single message for asynchronous delivery.
    async fn route(&self, message: RoutingMessage) -> HubResult<()>;

    /// Submit a batch of messages. The order of `messages` is the order the
    /// caller received them in.
    async fn route_batch(&self, messages: Vec<RoutingMessage>) -> HubResult<()>;

    /// Release the engine and everything it owns.
    async fn release(&self) -> HubResult<()>;
}

/// Owner of every device and cloud connection of the gateway.
///
/// Each lookup returns a fresh snapshot. Callers must not keep the returned
/// proxies beyond the operation they were fetched for.
pub trait ConnectionManager: Send + Sync + 'static {
    /// Live connection to a local device or module, if any.
    fn get_device_connection(&self, id: &str) -> Option<Arc<dyn DeviceProxy>>;

    /// Live connection to the cloud on behalf of `id`, if any.
    fn get_cloud_connection(&self, id: &str) -> Option<Arc<dyn CloudProxy>>;

    /// Subscription flags recorded for `id`.
    fn get_subscriptions(&self, id: &str) -> Option<SubscriptionState>;

    /// Record `subscription` as active for `id`.
    fn add_subscription(&self, id: &str, subscription: DeviceSubscription);

    /// Record `subscription` as inactive for `id`.
    fn remove_subscription(&self, id: &str, subscription: DeviceSubscription);

    /// Receiver notified every time a cloud connection becomes available for
    /// an identity, reconnections after an outage included.
    fn subscribe_cloud_connection_established(&self) -> broadcast::Receiver<Identity>;
}

/// Persists device twins and keeps them in sync with the cloud.
#[async_trait]
pub trait TwinManager: Send + Sync + 'static {
    async fn get_twin(&self, id: &str) -> HubResult<Message>;

    async fn update_reported_properties(&self, id: &str, reported: Message) -> HubResult<()>;

    async fn update_desired_properties(&self, id: &str, twin_collection: Message)
        -> HubResult<()>;
}

/// Converts hub messages into the routing engine's representation.
pub trait MessageConverter: Send + Sync + 'static {
    fn from_hub_message(&self, message: &Message, source: MessageSource)
        -> HubResult<RoutingMessage>;
}

/// Live connection to a local device or module.
#[async_trait]
pub trait DeviceProxy: Send + Sync + 'static {
    async fn invoke_method(&self, request: DirectMethodRequest)
        -> HubResult<DirectMethodResponse>;

    async fn send_c2d_message(&self, message: Message) -> HubResult<()>;
}

/// Live connection to the cloud broker on behalf of one identity.
///
/// All setup/remove calls are expected to be idempotent: the hub replays them
/// on every reconnection.
#[async_trait]
pub trait CloudProxy: Send + Sync + 'static {
    /// Start receiving cloud-to-device messages. Listening stops only when the
    /// connection is torn down.
    fn start_listening(&self);

    async fn setup_desired_property_updates(&self) -> HubResult<()>;

    async fn remove_desired_property_updates(&self) -> HubResult<()>;

    async fn setup_call_method(&self) -> HubResult<()>;

    async fn remove_call_method(&self) -> HubResult<()>;
}
