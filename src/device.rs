//! Backend contract and device identities.
//!
//! A [`Backend`] is one native input API family after it has been resolved and
//! initialized. It knows how to enumerate what is attached and how to read one
//! device. It knows nothing about registry ids; those belong to
//! [`DeviceRegistry`](crate::registry::DeviceRegistry).

use std::fmt;

use serde::Serialize;

use crate::error::ReadError;
use crate::guid::Guid;
use crate::metadata::DeviceMeta;
use crate::state::GamepadState;

/// Which native API family a backend speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    #[serde(rename = "dinput8")]
    DirectInput8,
    #[serde(rename = "xinput")]
    XInput,
    #[serde(rename = "virtual")]
    Virtual,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::DirectInput8 => "dinput8",
            BackendKind::XInput => "xinput",
            BackendKind::Virtual => "virtual",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry-assigned device handle. Never reused within one context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Backend-local identity of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKey {
    /// Fixed slot number (XInput user index, virtual pad slot).
    Slot(u32),
    /// DirectInput instance GUID.
    Instance(Guid),
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKey::Slot(n) => write!(f, "slot {n}"),
            DeviceKey::Instance(g) => write!(f, "{g}"),
        }
    }
}

/// One native input API, ready to enumerate and read devices.
///
/// Backends are driven from a single thread and are not required to be `Send`.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Name of the native library backing this instance, if any.
    fn library(&self) -> Option<&str> {
        None
    }

    /// Enumerate currently attached devices.
    ///
    /// `Err` means the enumeration itself failed; the caller keeps its previous view.
    fn scan(&mut self) -> Result<Vec<(DeviceKey, DeviceMeta)>, ReadError>;

    /// Read a complete state snapshot for `key`.
    fn read(&mut self, key: &DeviceKey) -> Result<GamepadState, ReadError>;

    /// Release per-device resources after the registry drops `key`.
    fn close(&mut self, _key: &DeviceKey) {}
}
