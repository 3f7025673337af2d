//! Hand-off of processed messages to the routing engine.

use crate::processor::MessageProcessor;
use edge_hub_error::HubResult;
use edge_hub_models::{Message, MessageSource, RoutingEngine, RoutingMessage};
use std::sync::Arc;

/// Submits messages to the routing engine.
///
/// The dispatcher has no view of route matches or endpoint delivery; it
/// submits once and returns whatever the engine reports.
pub struct RoutingDispatcher {
    router: Arc<dyn RoutingEngine>,
    processor: Arc<MessageProcessor>,
}

impl RoutingDispatcher {
    pub fn new(router: Arc<dyn RoutingEngine>, processor: Arc<MessageProcessor>) -> Self {
        Self { router, processor }
    }

    /// Submit an already processed message.
    #[inline]
    pub async fn route(&self, message: RoutingMessage) -> HubResult<()> {
        self.router.route(message).await
    }

    /// Submit already processed messages, keeping their order.
    #[inline]
    pub async fn route_batch(&self, messages: Vec<RoutingMessage>) -> HubResult<()> {
        self.router.route_batch(messages).await
    }

    /// Process a hub message and submit it.
    pub async fn dispatch(
        &self,
        message: Message,
        source: MessageSource,
        validate_size: bool,
    ) -> HubResult<()> {
        let routing_message = self.processor.process(message, source, validate_size)?;
        self.route(routing_message).await
    }

    /// Process a batch of device messages and submit them together.
    ///
    /// All messages are processed (and size checked) before anything is
    /// submitted, so a single rejected message fails the whole batch without
    /// a partial submission.
    pub async fn dispatch_batch(&self, messages: Vec<Message>) -> HubResult<()> {
        let routing_messages = messages
            .into_iter()
            .map(|m| self.processor.process(m, MessageSource::Telemetry, true))
            .collect::<HubResult<Vec<_>>>()?;
        self.route_batch(routing_messages).await
    }
}
