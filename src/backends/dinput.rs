//! DirectInput 8 backend.
//!
//! Enumerates game-controller class devices through the process-wide
//! `IDirectInput8W` object and reads each one through its own
//! `IDirectInputDevice8W` using the `DIJOYSTATE` data format.
//!
//! Every device is configured the same way when it is opened:
//! 1. `SetDataFormat` with the 44-object `DIJOYSTATE` table
//! 2. absolute axis mode and a `[-32768, 32767]` range on every axis
//! 3. `EnumObjects` to learn which axes, buttons and POVs actually exist
//!    (up to 8, 32 and 4, ordered by their offset in `DIJOYSTATE`)
//! 4. `Acquire`
//!
//! Reads `Poll` and then `GetDeviceState`. Losing acquisition (focus change,
//! driver reset) triggers exactly one re-acquire before the read is reported
//! as failed.
//!
//! Controllers that XInput already serves are skipped when the platform can
//! tell which products those are, so they are not reported twice.

use std::collections::{HashMap, HashSet};

use windows_sys::core::HRESULT;
use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    DI8DEVCLASS_GAMECTRL, DIDFT_ALL, DIDFT_AXIS, DIDFT_BUTTON, DIDFT_POV, DIEDFL_ALLDEVICES,
    DIEDFL_ATTACHEDONLY, DIERR_INPUTLOST, DIERR_NOTACQUIRED, DIJOYSTATE,
};

use crate::com::{
    axis_at, button_at, didft_get_type, dijofs_button, dijofs_pov, empty_joystate, joystate_format,
    joystate_objects, pov_at, succeeded, wide_to_string, ComPtr, IDirectInput8W,
    IDirectInputDevice8W,
};
use crate::device::{Backend, BackendKind, DeviceKey};
use crate::error::{InitError, ReadError};
use crate::guid::Guid;
use crate::hat::HatState;
use crate::interface::create_direct_input;
use crate::library::NativeLibrary;
use crate::metadata::DeviceMeta;
use crate::platform::{Platform, XInputProducts};
use crate::state::{normalize_ranged, GamepadState};

pub const MAX_AXES: usize = 8;
pub const MAX_BUTTONS: usize = 32;
pub const MAX_POVS: usize = 4;

pub const AXIS_MIN: i32 = -32768;
pub const AXIS_MAX: i32 = 32767;

/// Enumeration options.
#[derive(Clone, Copy, Debug)]
pub struct DirectInputOptions {
    pub attached_only: bool,
    pub skip_xinput_devices: bool,
}

impl Default for DirectInputOptions {
    fn default() -> Self {
        Self {
            attached_only: true,
            skip_xinput_devices: true,
        }
    }
}

/// Object offsets discovered for one device, each list sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ObjectLayout {
    axes: Vec<u32>,
    buttons: Vec<u32>,
    povs: Vec<u32>,
}

impl ObjectLayout {
    fn read(&self, raw: &DIJOYSTATE) -> GamepadState {
        GamepadState::new(
            self.axes
                .iter()
                .map(|&o| normalize_ranged(axis_at(raw, o)))
                .collect(),
            self.buttons.iter().map(|&o| button_at(raw, o)).collect(),
            self.povs
                .iter()
                .map(|&o| HatState::from_pov(pov_at(raw, o)))
                .collect(),
        )
    }
}

struct OpenDevice {
    device: ComPtr<IDirectInputDevice8W>,
    layout: ObjectLayout,
}

impl Drop for OpenDevice {
    fn drop(&mut self) {
        self.device.unacquire();
    }
}

#[inline]
fn lost_acquisition(hr: HRESULT) -> bool {
    hr == DIERR_INPUTLOST || hr == DIERR_NOTACQUIRED
}

fn configure(device: &ComPtr<IDirectInputDevice8W>) -> Result<ObjectLayout, HRESULT> {
    let mut objects = joystate_objects();
    let hr = device.set_data_format(&joystate_format(&mut objects));
    if !succeeded(hr) {
        return Err(hr);
    }

    let hr = device.set_absolute_axis_mode();
    if !succeeded(hr) {
        log::debug!("[dinput8] absolute axis mode rejected: 0x{hr:08x}");
    }

    let mut layout = ObjectLayout::default();
    for obj in device.enum_objects(DIDFT_ALL)? {
        let kind = didft_get_type(obj.dwType);
        let ofs = obj.dwOfs;
        if kind & DIDFT_AXIS != 0 {
            // Objects the data format did not map land outside the axis block.
            if ofs >= dijofs_pov(0) {
                continue;
            }
            let hr = device.set_axis_range(obj.dwType, AXIS_MIN, AXIS_MAX);
            if !succeeded(hr) {
                log::debug!("[dinput8] range rejected for axis at {ofs}: 0x{hr:08x}");
            }
            layout.axes.push(ofs);
        } else if kind & DIDFT_BUTTON != 0 {
            if (dijofs_button(0)..dijofs_button(MAX_BUTTONS as u32)).contains(&ofs) {
                layout.buttons.push(ofs);
            }
        } else if kind & DIDFT_POV != 0 && (dijofs_pov(0)..dijofs_button(0)).contains(&ofs) {
            layout.povs.push(ofs);
        }
    }

    for list in [&mut layout.axes, &mut layout.buttons, &mut layout.povs] {
        list.sort_unstable();
        list.dedup();
    }
    layout.axes.truncate(MAX_AXES);
    layout.buttons.truncate(MAX_BUTTONS);
    layout.povs.truncate(MAX_POVS);

    let hr = device.acquire();
    if !succeeded(hr) {
        log::debug!("[dinput8] initial acquire failed: 0x{hr:08x}");
    }
    Ok(layout)
}

fn fetch(device: &ComPtr<IDirectInputDevice8W>) -> Result<DIJOYSTATE, HRESULT> {
    let mut raw = empty_joystate();
    let attempt = |raw: &mut DIJOYSTATE| {
        let hr = device.poll();
        if succeeded(hr) {
            device.get_joy_state(raw)
        } else {
            hr
        }
    };

    let mut hr = attempt(&mut raw);
    if lost_acquisition(hr) {
        device.acquire();
        hr = attempt(&mut raw);
    }
    if succeeded(hr) {
        Ok(raw)
    } else {
        Err(hr)
    }
}

/// DirectInput 8 reader.
///
/// Field order is drop order: open devices are released before the
/// `IDirectInput8W` object, and that before the library is freed.
pub struct DirectInputBackend<L: NativeLibrary> {
    devices: HashMap<Guid, OpenDevice>,
    api: ComPtr<IDirectInput8W>,
    library: L,
    options: DirectInputOptions,
    xinput_products: XInputProducts,
}

impl<L: NativeLibrary> DirectInputBackend<L> {
    /// Create the `IDirectInput8W` object from a loaded `dinput8` library.
    pub fn open<P>(platform: &P, library: L, options: DirectInputOptions) -> Result<Self, InitError>
    where
        P: Platform<Library = L>,
    {
        let api = create_direct_input(platform, &library)?;
        log::info!("[dinput8] IDirectInput8W created from {}", library.name());
        Ok(Self {
            devices: HashMap::new(),
            api,
            library,
            options,
            xinput_products: platform.xinput_products(),
        })
    }

    fn open_device(&mut self, instance: Guid) -> Result<(), HRESULT> {
        if self.devices.contains_key(&instance) {
            return Ok(());
        }
        let device = self.api.create_device(instance.as_raw())?;
        let layout = configure(&device)?;
        log::debug!(
            "[dinput8] {instance}: {} axes, {} buttons, {} povs",
            layout.axes.len(),
            layout.buttons.len(),
            layout.povs.len()
        );
        self.devices.insert(instance, OpenDevice { device, layout });
        Ok(())
    }

    /// Number of devices currently opened.
    pub fn open_count(&self) -> usize {
        self.devices.len()
    }
}

impl<L: NativeLibrary> Backend for DirectInputBackend<L> {
    fn kind(&self) -> BackendKind {
        BackendKind::DirectInput8
    }

    fn library(&self) -> Option<&str> {
        Some(self.library.name())
    }

    fn scan(&mut self) -> Result<Vec<(DeviceKey, DeviceMeta)>, ReadError> {
        let flags = if self.options.attached_only {
            DIEDFL_ATTACHEDONLY
        } else {
            DIEDFL_ALLDEVICES
        };
        let instances = self
            .api
            .enum_devices(DI8DEVCLASS_GAMECTRL, flags)
            .map_err(ReadError::Status)?;

        let skip: HashSet<u32> = if self.options.skip_xinput_devices {
            (self.xinput_products)()
        } else {
            HashSet::new()
        };

        let mut found = Vec::with_capacity(instances.len());
        for inst in instances {
            let instance = Guid(inst.guidInstance);
            let product = Guid(inst.guidProduct);
            let name = wide_to_string(&inst.tszProductName);
            if skip.contains(&product.0.data1) {
                log::debug!("[dinput8] skipping {name}: served by XInput");
                continue;
            }
            if let Err(hr) = self.open_device(instance) {
                log::warn!("[dinput8] could not open {name}: 0x{hr:08x}");
                continue;
            }
            let meta = DeviceMeta {
                backend: BackendKind::DirectInput8.as_str().to_string(),
                product_string: Some(name),
                vid: Some(product.product_vid()),
                pid: Some(product.product_pid()),
                instance: Some(instance.to_string()),
                slot: None,
            };
            found.push((DeviceKey::Instance(instance), meta));
        }
        Ok(found)
    }

    fn read(&mut self, key: &DeviceKey) -> Result<GamepadState, ReadError> {
        let DeviceKey::Instance(instance) = key else {
            return Err(ReadError::Disconnected);
        };
        let open = self.devices.get(instance).ok_or(ReadError::Disconnected)?;
        match fetch(&open.device) {
            Ok(raw) => Ok(open.layout.read(&raw)),
            Err(hr) if lost_acquisition(hr) => Err(ReadError::Disconnected),
            Err(hr) => Err(ReadError::Status(hr)),
        }
    }

    fn close(&mut self, key: &DeviceKey) {
        if let DeviceKey::Instance(instance) = key {
            if self.devices.remove(instance).is_some() {
                log::debug!("[dinput8] closed {instance}");
            }
        }
    }
}
