//! Message processing in front of the routing engine.
//!
//! Every message entering the routing path is stamped with the hub's own
//! system properties and, for device traffic, checked against the maximum
//! message size before it is converted for the routing engine.

use edge_hub_error::{HubError, HubResult};
use edge_hub_models::{
    constants::{system_properties, DOWNSTREAM_ORIGIN_INTERFACE, INTERNAL_ORIGIN_INTERFACE},
    Message, MessageConverter, MessageSource, RoutingMessage,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct MessageProcessor {
    /// Device id of the gateway, used to tell internal from downstream traffic.
    edge_device_id: Arc<str>,
    max_message_size: u64,
    converter: Arc<dyn MessageConverter>,
}

impl MessageProcessor {
    pub fn new(
        edge_device_id: Arc<str>,
        max_message_size: u64,
        converter: Arc<dyn MessageConverter>,
    ) -> Self {
        Self {
            edge_device_id,
            max_message_size,
            converter,
        }
    }

    /// Stamp the hub-owned system properties onto `message`.
    ///
    /// The message id is always replaced by a fresh one. The origin interface
    /// is only set when the message carries a connection device id.
    pub fn stamp_system_properties(&self, message: &mut Message) {
        message.system_properties.insert(
            system_properties::EDGE_MESSAGE_ID.to_string(),
            Uuid::new_v4().to_string(),
        );

        let origin = message.connection_device_id().map(|device_id| {
            if device_id == &*self.edge_device_id {
                INTERNAL_ORIGIN_INTERFACE
            } else {
                DOWNSTREAM_ORIGIN_INTERFACE
            }
        });
        if let Some(origin) = origin {
            message.system_properties.insert(
                system_properties::EDGE_HUB_ORIGIN_INTERFACE.to_string(),
                origin.to_string(),
            );
        }
    }

    /// Stamp, convert and optionally size-check a message.
    ///
    /// The message is consumed: once stamped it only continues as the
    /// returned routing message. With `validate_size` set, a routing message
    /// larger than the configured maximum is rejected with
    /// [`HubError::MessageTooLarge`].
    pub fn process(
        &self,
        mut message: Message,
        source: MessageSource,
        validate_size: bool,
    ) -> HubResult<RoutingMessage> {
        self.stamp_system_properties(&mut message);
        let routing_message = self.converter.from_hub_message(&message, source)?;

        if validate_size {
            let size = routing_message.size();
            if size > self.max_message_size {
                debug!(
                    size,
                    limit = self.max_message_size,
                    "Rejecting message above the maximum size"
                );
                return Err(HubError::MessageTooLarge {
                    size,
                    limit: self.max_message_size,
                });
            }
        }

        Ok(routing_message)
    }
}
