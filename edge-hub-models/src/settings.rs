use crate::constants::{DEFAULT_CONFIG_FILE_NAME, ENV_PREFIX, MAX_MESSAGE_SIZE};
use config::{Config, File};
use edge_hub_error::{HubError, HubResult};
use serde::Deserialize;
use std::{ops::Deref, path::Path, sync::Arc};

#[derive(Debug, Clone)]
pub struct Settings(Arc<Inner>);

impl Deref for Settings {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Settings {
    /// Load settings from an optional file, then `EDGE_HUB__*` environment
    /// variables (e.g. `EDGE_HUB__HUB__EDGE_DEVICE_ID=edge1`).
    pub fn new(config_path: String) -> HubResult<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(config_path.as_str()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        let inner: Inner = builder.build()?.try_deserialize()?;
        inner.hub.validate()?;
        Ok(Self(Arc::new(inner)))
    }

    /// Load `edge-hub.toml` from `dir`, falling back to the environment when
    /// the file is absent.
    pub fn from_dir(dir: impl AsRef<Path>) -> HubResult<Self> {
        let path = dir.as_ref().join(DEFAULT_CONFIG_FILE_NAME);
        Self::new(path.to_string_lossy().into_owned())
    }

    /// Build settings directly from already-parsed sections.
    pub fn from_parts(hub: Hub, log: Log) -> HubResult<Self> {
        hub.validate()?;
        Ok(Self(Arc::new(Inner { hub, log })))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Inner {
    pub hub: Hub,
    #[serde(default)]
    pub log: Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hub {
    /// Device id of the gateway itself. Messages whose connection device id
    /// matches it are stamped as `internal`.
    pub edge_device_id: String,
    #[serde(default = "Hub::max_message_size_default")]
    pub max_message_size: u64,
    /// Upper bound for waiting on background tasks during release.
    #[serde(default = "Hub::shutdown_timeout_ms_default")]
    pub shutdown_timeout_ms: u64,
}

impl Hub {
    pub fn new(edge_device_id: impl Into<String>) -> Self {
        Self {
            edge_device_id: edge_device_id.into(),
            max_message_size: Self::max_message_size_default(),
            shutdown_timeout_ms: Self::shutdown_timeout_ms_default(),
        }
    }

    fn max_message_size_default() -> u64 {
        MAX_MESSAGE_SIZE
    }

    fn shutdown_timeout_ms_default() -> u64 {
        2_000
    }

    pub fn validate(&self) -> HubResult<()> {
        if self.edge_device_id.trim().is_empty() {
            return Err(HubError::ConfigurationError(
                "hub.edge_device_id must not be blank".to_string(),
            ));
        }
        // Compared verbatim against each message's connection device id.
        if self.edge_device_id.trim() != self.edge_device_id {
            return Err(HubError::ConfigurationError(
                "hub.edge_device_id must not have surrounding whitespace".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(HubError::ConfigurationError(
                "hub.max_message_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    #[serde(default = "Log::level_default")]
    pub level: String,
    #[serde(default = "Log::directory_default")]
    pub directory: String,
    #[serde(default = "Log::file_name_default")]
    pub file_name: String,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: Log::level_default(),
            directory: Log::directory_default(),
            file_name: Log::file_name_default(),
        }
    }
}

impl Log {
    fn level_default() -> String {
        "info".into()
    }

    fn directory_default() -> String {
        "logs".into()
    }

    fn file_name_default() -> String {
        "edge-hub.log".into()
    }
}
