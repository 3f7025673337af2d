use chrono::Utc;
use edge_hub_error::HubResult;
use edge_hub_models::{Message, MessageConverter, MessageSource, RoutingMessage};

/// Straight field-by-field conversion into a [`RoutingMessage`].
///
/// The enqueue time is taken at conversion, which for the hub is the moment
/// the message enters the routing path.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessageConverter;

impl MessageConverter for DefaultMessageConverter {
    fn from_hub_message(
        &self,
        message: &Message,
        source: MessageSource,
    ) -> HubResult<RoutingMessage> {
        Ok(RoutingMessage {
            source,
            body: message.body().clone(),
            properties: message.properties.clone(),
            system_properties: message.system_properties.clone(),
            enqueued_time: Utc::now(),
        })
    }
}
