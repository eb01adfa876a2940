//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of a device suitable
//! for UI display, logging, and persistence. Backends populate what they know;
//! unknown fields remain `None`.
//!
//! ## Persistence notes
//! - `vid`/`pid` are stable when the backend can see them (DirectInput product GUIDs).
//! - `instance` (DirectInput instance GUID) is stable across runs on the same machine.
//! - `slot` (XInput user index) is only stable while the controller stays connected.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// Backend family name (`"xinput"`, `"dinput8"`, `"virtual"`).
    pub backend: String,

    /// Human-readable product name.
    pub product_string: Option<String>,

    /// USB Vendor ID (VID), if known.
    pub vid: Option<u16>,

    /// USB Product ID (PID), if known.
    pub pid: Option<u16>,

    /// DirectInput instance GUID in registry format, if any.
    pub instance: Option<String>,

    /// Fixed slot number for slot-based APIs.
    pub slot: Option<u32>,
}

impl DeviceMeta {
    pub fn for_slot(backend: &str, slot: u32, product: impl Into<String>) -> Self {
        Self {
            backend: backend.to_string(),
            product_string: Some(product.into()),
            slot: Some(slot),
            ..Self::default()
        }
    }

    /// Best display label.
    pub fn label(&self) -> &str {
        self.product_string.as_deref().unwrap_or("Unknown")
    }
}
