// Constants shared by the edge hub crates.

/// The default configuration file name for the hub.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "edge-hub.toml";

/// Environment variable prefix used by the settings loader.
pub const ENV_PREFIX: &str = "EDGE_HUB";

/// Maximum routed message size in bytes (matches the cloud broker limit).
pub const MAX_MESSAGE_SIZE: u64 = 256 * 1024;

/// Status code of a direct method response that could not be delivered.
pub const METHOD_NOT_FOUND_STATUS: u16 = 404;

pub mod system_properties {
    /// Hub generated unique id, stamped on every processed message.
    pub const EDGE_MESSAGE_ID: &str = "edgeMessageId";
    /// Device id of the connection the message arrived on.
    pub const CONNECTION_DEVICE_ID: &str = "connectionDeviceId";
    /// Whether the message came from the gateway itself or a downstream client.
    pub const EDGE_HUB_ORIGIN_INTERFACE: &str = "edgeHubOriginInterface";
}

pub const INTERNAL_ORIGIN_INTERFACE: &str = "internal";
pub const DOWNSTREAM_ORIGIN_INTERFACE: &str = "downstream";
