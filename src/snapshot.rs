//! Diagnostic snapshot of the gamepad context.
//!
//! [`Snapshot`] is an **owned**, read-only view produced by
//! [`NativeGamepads::snapshot`](crate::manager::NativeGamepads::snapshot). It
//! does not poll anything; device states are whatever the last `update`
//! stored. It serializes to JSON for logs and bug reports.
//!
//! ```no_run
//! use nativepad::NativeGamepads;
//!
//! let mut pads = NativeGamepads::new();
//! let _ = pads.init();
//! pads.update_all();
//! println!("{}", pads.snapshot().to_json().unwrap());
//! ```

use serde::Serialize;

use crate::device::{BackendKind, DeviceId};
use crate::metadata::DeviceMeta;
use crate::state::GamepadState;

#[derive(Clone, Debug, Serialize)]
pub struct BackendStatus {
    pub kind: BackendKind,
    pub available: bool,
    /// Library the backend was loaded from, if native.
    pub library: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub meta: DeviceMeta,
    pub present: bool,
    pub state: GamepadState,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Snapshot {
    pub backends: Vec<BackendStatus>,
    pub devices: Vec<DeviceSnapshot>,
}

impl Snapshot {
    /// Entry for `id`, if it was registered at snapshot time.
    #[inline]
    pub fn get(&self, id: DeviceId) -> Option<&DeviceSnapshot> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
