//! Edge hub core.
//!
//! Orchestrates everything a connected device or module does through the
//! hub: telemetry routing, direct methods, twin updates, cloud-to-device
//! messages and subscription changes. The routing engine, connection manager
//! and twin manager are injected collaborators (see `edge_hub_models`).
pub mod cloud;
pub mod converter;
pub mod dispatcher;
pub mod hub;
pub mod method;
pub mod processor;
pub mod twin;

pub use cloud::{CloudConnectionListener, SubscriptionSynchronizer};
pub use converter::DefaultMessageConverter;
pub use dispatcher::RoutingDispatcher;
pub use hub::EdgeHub;
pub use method::MethodInvoker;
pub use processor::MessageProcessor;
pub use twin::TwinBridge;
