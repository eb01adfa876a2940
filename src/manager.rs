//! The gamepad context.
//!
//! [`NativeGamepads`] owns every backend slot, the [`DeviceRegistry`] and the
//! init/teardown lifecycle. It replaces any notion of process-global backend
//! state: create one, call [`init`](NativeGamepads::init) once, then drive
//! [`update`](NativeGamepads::update) every frame.
//!
//! # Lifecycle
//! - `init()` resolves each enabled library family, creates its interface
//!   objects and performs the first rescan. Calling it again is a no-op until
//!   `shutdown()`.
//! - `shutdown()` (also run on drop) closes every device, then releases
//!   interface pointers, then frees libraries. Afterwards the context is empty
//!   and `init()` may be called again.
//!
//! # Threading
//! Everything happens on the caller's thread. Backends are not `Send`.
//!
//! # Example
//! ```no_run
//! use nativepad::NativeGamepads;
//!
//! let mut pads = NativeGamepads::new();
//! if let Err(e) = pads.init() {
//!     eprintln!("one backend failed to start: {e}");
//! }
//! for id in pads.ids() {
//!     pads.update(id);
//!     let pad = pads.gamepad(id);
//!     println!("{id}: {} axes, present={}", pad.axis_num(), pad.present());
//! }
//! ```

use crate::backends::dinput::{DirectInputBackend, DirectInputOptions};
use crate::backends::xinput::XInputBackend;
use crate::config::BackendConfig;
use crate::device::{Backend, BackendKind, DeviceId};
use crate::error::{InitError, ReadError};
use crate::gamepad::NativeGamepad;
use crate::library::{resolve, Availability, LibraryFamily};
use crate::metadata::DeviceMeta;
use crate::platform::{Platform, SystemPlatform};
use crate::registry::DeviceRegistry;
use crate::snapshot::{BackendStatus, DeviceSnapshot, Snapshot};

/// OS notification that the set of attached devices may have changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hotplug {
    /// Something was plugged in. Triggers a rescan.
    Arrived,
    /// Something was unplugged. Every device is refreshed and the ones that
    /// no longer answer are unregistered.
    Removed,
}

struct BackendSlot {
    kind: BackendKind,
    backend: Availability<Box<dyn Backend>>,
}

pub struct NativeGamepads<P: Platform = SystemPlatform> {
    registry: DeviceRegistry,
    slots: Vec<BackendSlot>,
    platform: P,
    config: BackendConfig,
    initialized: bool,
}

impl NativeGamepads<SystemPlatform> {
    /// Context for the host OS with the stock configuration.
    pub fn new() -> Self {
        Self::with_config(SystemPlatform::default(), BackendConfig::default())
    }
}

impl Default for NativeGamepads<SystemPlatform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> NativeGamepads<P> {
    /// Manager over `platform` with the default backend configuration.
    pub fn with_platform(platform: P) -> Self {
        Self::with_config(platform, BackendConfig::default())
    }

    /// Manager over `platform` using `config`. Nothing is loaded until [`init`].
    ///
    /// [`init`]: NativeGamepads::init
    pub fn with_config(platform: P, config: BackendConfig) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            slots: Vec::new(),
            platform,
            config,
            initialized: false,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// `true` between a successful `init` and the next `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Resolve libraries, create interfaces and run the first rescan.
    ///
    /// A missing library is not an error. An error means a library *loaded*
    /// but could not be initialized; that backend stays unavailable, the other
    /// families are still brought up, and the first such error is returned.
    pub fn init(&mut self) -> Result<(), InitError> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        let mut first_error = None;
        let mut note = |kind: BackendKind, e: InitError| {
            log::warn!("[{kind}] initialization failed: {e}");
            first_error.get_or_insert(e);
        };

        let xinput = self.open_xinput().unwrap_or_else(|e| {
            note(BackendKind::XInput, e);
            Availability::Unavailable
        });
        let dinput = self.open_dinput().unwrap_or_else(|e| {
            note(BackendKind::DirectInput8, e);
            Availability::Unavailable
        });
        self.slots.push(BackendSlot {
            kind: BackendKind::XInput,
            backend: xinput,
        });
        self.slots.push(BackendSlot {
            kind: BackendKind::DirectInput8,
            backend: dinput,
        });

        self.rescan();
        first_error.map_or(Ok(()), Err)
    }

    fn open_xinput(&self) -> Result<Availability<Box<dyn Backend>>, InitError> {
        if !self.config.xinput.enabled {
            log::debug!("[xinput] disabled by config");
            return Ok(Availability::Unavailable);
        }
        let family = LibraryFamily::from_config(BackendKind::XInput.as_str(), &self.config.xinput);
        let Some(library) = resolve(&self.platform, &family).available() else {
            return Ok(Availability::Unavailable);
        };
        let backend = XInputBackend::open(library)?;
        Ok(Availability::Available(Box::new(backend)))
    }

    fn open_dinput(&self) -> Result<Availability<Box<dyn Backend>>, InitError> {
        if !self.config.dinput.enabled {
            log::debug!("[dinput8] disabled by config");
            return Ok(Availability::Unavailable);
        }
        let family =
            LibraryFamily::from_config(BackendKind::DirectInput8.as_str(), &self.config.dinput);
        let Some(library) = resolve(&self.platform, &family).available() else {
            return Ok(Availability::Unavailable);
        };
        let options = DirectInputOptions {
            attached_only: self.config.attached_only,
            skip_xinput_devices: self.config.skip_xinput_devices,
        };
        let backend = DirectInputBackend::open(&self.platform, library, options)?;
        Ok(Availability::Available(Box::new(backend)))
    }

    /// Add a backend that is not resolved from a native library, such as a
    /// [`VirtualBackend`](crate::backends::VirtualBackend). Its devices are
    /// registered immediately.
    pub fn attach_backend(&mut self, backend: Box<dyn Backend>) {
        let kind = backend.kind();
        log::info!("[{kind}] backend attached");
        self.slots.push(BackendSlot {
            kind,
            backend: Availability::Available(backend),
        });
        self.rescan_slot(self.slots.len() - 1);
    }

    /// `true` if at least one backend of `kind` is up.
    pub fn is_available(&self, kind: BackendKind) -> bool {
        self.slots
            .iter()
            .any(|s| s.kind == kind && s.backend.is_available())
    }

    /// Re-enumerate every available backend.
    ///
    /// Devices still attached keep their ids. New devices get fresh ids and
    /// report zero channels until their first [`update`](Self::update).
    /// Vanished devices are unregistered and closed.
    pub fn rescan(&mut self) {
        for index in 0..self.slots.len() {
            self.rescan_slot(index);
        }
    }

    fn rescan_slot(&mut self, index: usize) {
        let Availability::Available(backend) = self.slots[index].backend.as_mut() else {
            return;
        };
        match backend.scan() {
            Ok(found) => {
                for key in self.registry.replace_backend(index, found) {
                    backend.close(&key);
                }
            }
            Err(e) => log::debug!(
                "[{}] scan failed, keeping previous view: {e}",
                backend.kind()
            ),
        }
    }

    /// Refresh one device from its backend. Returns its presence afterwards.
    ///
    /// A failed read is not an error: the device reads as not present until a
    /// later update succeeds. Unknown ids return `false`.
    pub fn update(&mut self, id: DeviceId) -> bool {
        let Some(entry) = self.registry.entry_mut(id) else {
            return false;
        };
        let slot = self.slots.get_mut(entry.backend);
        let read = match slot.map(|s| s.backend.as_mut()) {
            Some(Availability::Available(backend)) => backend.read(&entry.key),
            _ => Err(ReadError::Disconnected),
        };
        entry.pad.apply(read);
        entry.pad.present()
    }

    /// Refresh every registered device.
    pub fn update_all(&mut self) {
        for id in self.ids() {
            self.update(id);
        }
    }

    /// Unregister `id` and close it on its backend. Returns `false` if unknown.
    pub fn remove(&mut self, id: DeviceId) -> bool {
        let Some((index, key)) = self.registry.remove(id) else {
            return false;
        };
        if let Some(Availability::Available(backend)) =
            self.slots.get_mut(index).map(|s| s.backend.as_mut())
        {
            backend.close(&key);
        }
        true
    }

    /// React to a device-change notification.
    ///
    /// An arrival rescans every backend. A removal re-reads each registered
    /// device and unregisters the ones that no longer answer.
    pub fn handle_hotplug(&mut self, event: Hotplug) {
        match event {
            Hotplug::Arrived => self.rescan(),
            Hotplug::Removed => {
                for id in self.ids() {
                    if !self.update(id) {
                        self.remove(id);
                    }
                }
            }
        }
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<DeviceId> {
        self.registry.ids().collect()
    }

    /// The gamepad for `id`. Unknown or removed ids give an absent gamepad
    /// with zero channels.
    pub fn gamepad(&self, id: DeviceId) -> &NativeGamepad {
        self.registry.gamepad(id)
    }

    /// Identity captured when `id` was registered.
    pub fn meta(&self, id: DeviceId) -> Option<&DeviceMeta> {
        self.registry.meta(id)
    }

    /// Diagnostic view of backends and devices, as last updated.
    pub fn snapshot(&self) -> Snapshot {
        let backends = self
            .slots
            .iter()
            .map(|s| BackendStatus {
                kind: s.kind,
                available: s.backend.is_available(),
                library: match &s.backend {
                    Availability::Available(b) => b.library().map(str::to_string),
                    Availability::Unavailable => None,
                },
            })
            .collect();
        let devices = self
            .registry
            .ids()
            .filter_map(|id| {
                let meta = self.registry.meta(id)?.clone();
                let pad = self.registry.gamepad(id);
                Some(DeviceSnapshot {
                    id,
                    meta,
                    present: pad.present(),
                    state: pad.state().clone(),
                })
            })
            .collect();
        Snapshot { backends, devices }
    }

    /// Close all devices, release interfaces, free libraries.
    ///
    /// Attached backends are dropped too. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.initialized && self.slots.is_empty() {
            return;
        }
        for (index, key) in self.registry.clear() {
            if let Some(Availability::Available(backend)) =
                self.slots.get_mut(index).map(|s| s.backend.as_mut())
            {
                backend.close(&key);
            }
        }
        // Each backend drops its interface before its library.
        self.slots.clear();
        self.initialized = false;
        log::debug!("gamepad context shut down");
    }
}

impl<P: Platform> Drop for NativeGamepads<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
