#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use edge_hub_core::{DefaultMessageConverter, EdgeHub};
use edge_hub_error::{HubError, HubResult};
use edge_hub_models::{
    settings::Hub, CloudProxy, ConnectionManager, DeviceProxy, DeviceSubscription,
    DirectMethodRequest, DirectMethodResponse, Identity, Message, MessageConverter, RoutingEngine,
    RoutingMessage, SubscriptionState, TwinManager,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, Once,
    },
    time::Duration,
};
use tokio::sync::broadcast;
use tracing::Level;

pub const EDGE_DEVICE_ID: &str = "edge1";

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

/// Failure injected into a mock collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Timeout,
    Other,
}

impl Failure {
    fn to_error(self, what: &str) -> HubError {
        match self {
            Failure::Timeout => HubError::Timeout(Duration::from_secs(30)),
            Failure::Other => HubError::Collaborator(format!("{} failed", what)),
        }
    }
}

// ============================================================================
// Routing engine
// ============================================================================

#[derive(Default)]
pub struct MockRoutingEngine {
    pub routed: Mutex<Vec<RoutingMessage>>,
    pub batches: Mutex<Vec<Vec<RoutingMessage>>>,
    pub route_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockRoutingEngine {
    pub fn routed(&self) -> Vec<RoutingMessage> {
        self.routed.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<RoutingMessage>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> usize {
        self.route_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingEngine for MockRoutingEngine {
    async fn route(&self, message: RoutingMessage) -> HubResult<()> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Failure::Other.to_error("route"));
        }
        self.routed.lock().unwrap().push(message);
        Ok(())
    }

    async fn route_batch(&self, messages: Vec<RoutingMessage>) -> HubResult<()> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Failure::Other.to_error("route batch"));
        }
        self.batches.lock().unwrap().push(messages);
        Ok(())
    }

    async fn release(&self) -> HubResult<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Cloud proxy
// ============================================================================

#[derive(Default)]
pub struct MockCloudProxy {
    pub start_listening_calls: AtomicUsize,
    pub setup_desired_calls: AtomicUsize,
    pub remove_desired_calls: AtomicUsize,
    pub setup_methods_calls: AtomicUsize,
    pub remove_methods_calls: AtomicUsize,
    listening: AtomicBool,
    desired_updates: AtomicBool,
    method_calls: AtomicBool,
    failure: Mutex<Option<Failure>>,
    delay: Mutex<Option<Duration>>,
}

/// Cloud-side listening state visible to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudState {
    pub listening: bool,
    pub desired_updates: bool,
    pub method_calls: bool,
}

impl MockCloudProxy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    /// Make `setup_call_method` take `delay` before completing.
    pub fn delay_with(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn state(&self) -> CloudState {
        CloudState {
            listening: self.listening.load(Ordering::SeqCst),
            desired_updates: self.desired_updates.load(Ordering::SeqCst),
            method_calls: self.method_calls.load(Ordering::SeqCst),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.start_listening_calls.load(Ordering::SeqCst)
            + self.setup_desired_calls.load(Ordering::SeqCst)
            + self.remove_desired_calls.load(Ordering::SeqCst)
            + self.setup_methods_calls.load(Ordering::SeqCst)
            + self.remove_methods_calls.load(Ordering::SeqCst)
    }

    fn check(&self, what: &str) -> HubResult<()> {
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error(what)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudProxy for MockCloudProxy {
    fn start_listening(&self) {
        self.start_listening_calls.fetch_add(1, Ordering::SeqCst);
        self.listening.store(true, Ordering::SeqCst);
    }

    async fn setup_desired_property_updates(&self) -> HubResult<()> {
        self.setup_desired_calls.fetch_add(1, Ordering::SeqCst);
        self.check("setup desired property updates")?;
        self.desired_updates.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_desired_property_updates(&self) -> HubResult<()> {
        self.remove_desired_calls.fetch_add(1, Ordering::SeqCst);
        self.check("remove desired property updates")?;
        self.desired_updates.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn setup_call_method(&self) -> HubResult<()> {
        self.setup_methods_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check("setup call method")?;
        self.method_calls.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_call_method(&self) -> HubResult<()> {
        self.remove_methods_calls.fetch_add(1, Ordering::SeqCst);
        self.check("remove call method")?;
        self.method_calls.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Device proxy
// ============================================================================

pub struct MockDeviceProxy {
    pub invoke_calls: AtomicUsize,
    pub c2d_messages: Mutex<Vec<Message>>,
    pub fail: AtomicBool,
}

impl MockDeviceProxy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            invoke_calls: AtomicUsize::new(0),
            c2d_messages: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn invocations(&self) -> usize {
        self.invoke_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceProxy for MockDeviceProxy {
    async fn invoke_method(&self, request: DirectMethodRequest) -> HubResult<DirectMethodResponse> {
        self.invoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Failure::Other.to_error("invoke method"));
        }
        let payload = format!("{{\"method\":\"{}\"}}", request.name);
        Ok(DirectMethodResponse::new(Some(Bytes::from(payload)), 200))
    }

    async fn send_c2d_message(&self, message: Message) -> HubResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Failure::Other.to_error("send c2d message"));
        }
        self.c2d_messages.lock().unwrap().push(message);
        Ok(())
    }
}

// ============================================================================
// Connection manager
// ============================================================================

pub struct MockConnectionManager {
    devices: Mutex<HashMap<String, Arc<MockDeviceProxy>>>,
    clouds: Mutex<HashMap<String, Arc<MockCloudProxy>>>,
    subscriptions: Mutex<HashMap<String, SubscriptionState>>,
    cloud_established: broadcast::Sender<Identity>,
}

impl MockConnectionManager {
    pub fn new() -> Arc<Self> {
        let (cloud_established, _) = broadcast::channel(16);
        Arc::new(Self {
            devices: Mutex::new(HashMap::new()),
            clouds: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
            cloud_established,
        })
    }

    pub fn connect_device(&self, identity: &Identity) -> Arc<MockDeviceProxy> {
        let proxy = MockDeviceProxy::new();
        self.devices
            .lock()
            .unwrap()
            .insert(identity.id().to_string(), Arc::clone(&proxy));
        proxy
    }

    /// Register a cloud connection without raising the established
    /// notification.
    pub fn attach_cloud(&self, identity: &Identity, proxy: Arc<MockCloudProxy>) {
        self.clouds
            .lock()
            .unwrap()
            .insert(identity.id().to_string(), proxy);
    }

    /// Register a cloud connection and notify listeners, like a real
    /// (re)connection would.
    pub fn connect_cloud(&self, identity: &Identity, proxy: Arc<MockCloudProxy>) {
        self.attach_cloud(identity, proxy);
        let _ = self.cloud_established.send(identity.clone());
    }

    pub fn disconnect_cloud(&self, identity: &Identity) {
        self.clouds.lock().unwrap().remove(identity.id());
    }

    pub fn set_subscription(&self, id: &str, subscription: DeviceSubscription, active: bool) {
        self.subscriptions
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .insert(subscription, active);
    }

    pub fn subscription(&self, id: &str, subscription: DeviceSubscription) -> Option<bool> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(id)
            .and_then(|s| s.get(&subscription).copied())
    }

    pub fn notification_receivers(&self) -> usize {
        self.cloud_established.receiver_count()
    }
}

impl ConnectionManager for MockConnectionManager {
    fn get_device_connection(&self, id: &str) -> Option<Arc<dyn DeviceProxy>> {
        self.devices
            .lock()
            .unwrap()
            .get(id)
            .map(|p| Arc::clone(p) as Arc<dyn DeviceProxy>)
    }

    fn get_cloud_connection(&self, id: &str) -> Option<Arc<dyn CloudProxy>> {
        self.clouds
            .lock()
            .unwrap()
            .get(id)
            .map(|p| Arc::clone(p) as Arc<dyn CloudProxy>)
    }

    fn get_subscriptions(&self, id: &str) -> Option<SubscriptionState> {
        self.subscriptions.lock().unwrap().get(id).cloned()
    }

    fn add_subscription(&self, id: &str, subscription: DeviceSubscription) {
        self.set_subscription(id, subscription, true);
    }

    fn remove_subscription(&self, id: &str, subscription: DeviceSubscription) {
        self.set_subscription(id, subscription, false);
    }

    fn subscribe_cloud_connection_established(&self) -> broadcast::Receiver<Identity> {
        self.cloud_established.subscribe()
    }
}

// ============================================================================
// Twin manager
// ============================================================================

#[derive(Default)]
pub struct MockTwinManager {
    pub reported: Mutex<Vec<(String, Message)>>,
    pub desired: Mutex<Vec<(String, Message)>>,
    pub reported_calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl TwinManager for MockTwinManager {
    async fn get_twin(&self, id: &str) -> HubResult<Message> {
        Ok(Message::new(format!("{{\"deviceId\":\"{}\"}}", id)))
    }

    async fn update_reported_properties(&self, id: &str, reported: Message) -> HubResult<()> {
        self.reported_calls.fetch_add(1, Ordering::SeqCst);
        // Yield so the routing side gets a chance to run in between.
        tokio::task::yield_now().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(Failure::Other.to_error("update reported properties"));
        }
        self.reported
            .lock()
            .unwrap()
            .push((id.to_string(), reported));
        Ok(())
    }

    async fn update_desired_properties(&self, id: &str, twin_collection: Message) -> HubResult<()> {
        self.desired
            .lock()
            .unwrap()
            .push((id.to_string(), twin_collection));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub hub: EdgeHub,
    pub router: Arc<MockRoutingEngine>,
    pub connections: Arc<MockConnectionManager>,
    pub twins: Arc<MockTwinManager>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(Hub::new(EDGE_DEVICE_ID))
    }

    pub fn with_settings(settings: Hub) -> Self {
        Self::with_converter(settings, Arc::new(DefaultMessageConverter))
    }

    pub fn with_converter(settings: Hub, converter: Arc<dyn MessageConverter>) -> Self {
        init_tracing();
        let router = Arc::new(MockRoutingEngine::default());
        let connections = MockConnectionManager::new();
        let twins = Arc::new(MockTwinManager::default());
        let hub = EdgeHub::new(
            &settings,
            Arc::clone(&router) as Arc<dyn RoutingEngine>,
            converter,
            Arc::clone(&connections) as Arc<dyn ConnectionManager>,
            Arc::clone(&twins) as Arc<dyn TwinManager>,
        )
        .expect("create edge hub");
        Self {
            hub,
            router,
            connections,
            twins,
        }
    }
}

/// Poll `condition` until it holds or `deadline` passes.
pub async fn eventually<F>(deadline: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    loop {
        if condition() {
            return true;
        }
        if start.elapsed() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
