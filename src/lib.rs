//! Native gamepad backends.
//!
//! `nativepad` reads physical controllers through whichever native input API
//! the machine provides (XInput, DirectInput 8) and exposes them all through
//! one polling contract: ordered axes in `[-1, 1]`, buttons, and hats.
//! Missing libraries are a normal condition; the affected backend is simply
//! unavailable and its devices read as absent.
//!
//! Start with [`NativeGamepads`].

pub mod backends;
pub mod com;
pub mod config;
pub mod device;
pub mod error;
pub mod gamepad;
pub mod guid;
pub mod hat;
pub mod interface;
pub mod library;
pub mod manager;
pub mod metadata;
pub mod platform;
pub mod registry;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::{BackendConfig, FamilyConfig};
pub use device::{Backend, BackendKind, DeviceId, DeviceKey};
pub use error::{ConfigError, InitError, ReadError};
pub use gamepad::NativeGamepad;
pub use guid::Guid;
pub use hat::HatState;
pub use library::Availability;
pub use manager::{Hotplug, NativeGamepads};
pub use metadata::DeviceMeta;
pub use platform::{NullPlatform, Platform, SystemPlatform};
pub use snapshot::Snapshot;
pub use state::GamepadState;
