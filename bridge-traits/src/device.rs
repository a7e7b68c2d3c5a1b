//! Audio output device enumeration.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{error::Result, platform::PlatformSendSync};

/// Platform object a backend needs to open the device (an endpoint handle,
/// a device info struct). Opaque to the core.
pub type NativeDeviceHandle = Arc<dyn Any + Send + Sync>;

/// One selectable audio output device.
#[derive(Clone)]
pub struct OutputDevice {
    pub id: String,
    pub name: String,
    pub native_handle: Option<NativeDeviceHandle>,
}

impl OutputDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            native_handle: None,
        }
    }

    pub fn with_native_handle(mut self, handle: NativeDeviceHandle) -> Self {
        self.native_handle = Some(handle);
        self
    }

    /// Downcast the native handle to the platform type.
    pub fn native<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.native_handle.as_ref()?.downcast_ref::<T>()
    }
}

impl PartialEq for OutputDevice {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OutputDevice {}

impl fmt::Debug for OutputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputDevice")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("native_handle", &self.native_handle.is_some())
            .finish()
    }
}

/// Lists the output devices currently available on the host.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait OutputDeviceEnumerator: PlatformSendSync {
    async fn output_devices(&self) -> Result<Vec<OutputDevice>>;
}
