use std::{fmt, sync::Arc};

/// Stable identity of a device or a module hosted on a device.
///
/// Module identities use the `deviceId/moduleId` form for `id()`. The id is
/// computed once and shared, since it is cloned into every log line and
/// connection lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    id: Arc<str>,
    device_id: Arc<str>,
    module_id: Option<Arc<str>>,
}

impl Identity {
    pub fn device(device_id: impl Into<String>) -> Self {
        let device_id: Arc<str> = Arc::from(device_id.into());
        Self {
            id: Arc::clone(&device_id),
            device_id,
            module_id: None,
        }
    }

    pub fn module(device_id: impl Into<String>, module_id: impl Into<String>) -> Self {
        let device_id = device_id.into();
        let module_id = module_id.into();
        Self {
            id: Arc::from(format!("{}/{}", device_id, module_id)),
            device_id: Arc::from(device_id),
            module_id: Some(Arc::from(module_id)),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    #[inline]
    pub fn module_id(&self) -> Option<&str> {
        self.module_id.as_deref()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
