use serde::{Deserialize, Serialize};

/// Category of device-initiated interest.
///
/// Only `C2D`, `DesiredPropertyUpdates` and `Methods` change what the cloud
/// connection listens for. The remaining kinds are recorded but have no
/// cloud-side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceSubscription {
    C2D,
    DesiredPropertyUpdates,
    Methods,
    ModuleMessages,
    TwinResponse,
    Unknown,
}

impl DeviceSubscription {
    /// Whether toggling this subscription has to be propagated to the cloud.
    #[inline]
    pub fn affects_cloud(&self) -> bool {
        matches!(
            self,
            DeviceSubscription::C2D
                | DeviceSubscription::DesiredPropertyUpdates
                | DeviceSubscription::Methods
        )
    }
}

/// Where a routed message came from, as seen by the routing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSource {
    /// Device or module telemetry.
    Telemetry,
    /// Reported properties update of a twin.
    TwinChangeNotification,
}
