use crate::{
    constants::{system_properties, METHOD_NOT_FOUND_STATUS},
    enums::MessageSource,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Hub-side message as received from a device or module.
///
/// The body is immutable once the message is built. System properties are
/// reserved for the hub and the broker, application properties belong to the
/// sender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    body: Bytes,
    pub system_properties: HashMap<String, String>,
    pub properties: HashMap<String, String>,
}

impl Message {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            system_properties: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    pub fn with_system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system_properties.insert(key.into(), value.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    #[inline]
    pub fn system_property(&self, key: &str) -> Option<&str> {
        self.system_properties.get(key).map(String::as_str)
    }

    #[inline]
    pub fn connection_device_id(&self) -> Option<&str> {
        self.system_property(system_properties::CONNECTION_DEVICE_ID)
    }
}

/// Wire representation of a message handed to the routing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingMessage {
    pub source: MessageSource,
    pub body: Bytes,
    pub properties: HashMap<String, String>,
    pub system_properties: HashMap<String, String>,
    pub enqueued_time: DateTime<Utc>,
}

impl RoutingMessage {
    /// Size accounted against the maximum message size: the body plus every
    /// key and value of both property maps.
    pub fn size(&self) -> u64 {
        let props = |map: &HashMap<String, String>| -> u64 {
            map.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum()
        };
        self.body.len() as u64 + props(&self.properties) + props(&self.system_properties)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMethodRequest {
    /// Identity id of the device or module the method targets.
    pub id: String,
    pub name: String,
    pub correlation_id: String,
    pub payload: Bytes,
}

impl DirectMethodRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        correlation_id: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            correlation_id: correlation_id.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMethodResponse {
    pub payload: Option<Bytes>,
    pub error_payload: Option<Bytes>,
    pub status: u16,
}

impl DirectMethodResponse {
    pub fn new(payload: Option<Bytes>, status: u16) -> Self {
        Self {
            payload,
            error_payload: None,
            status,
        }
    }

    /// Response returned when the target cannot receive the call.
    pub fn not_found() -> Self {
        Self {
            payload: None,
            error_payload: None,
            status: METHOD_NOT_FOUND_STATUS,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.status == METHOD_NOT_FOUND_STATUS && self.payload.as_ref().is_none_or(Bytes::is_empty)
    }
}
