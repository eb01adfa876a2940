//! XInput backend.
//!
//! Polls the four fixed XInput user slots through `XInputGetState` resolved
//! from whichever XInput library loaded. `XInputGetCapabilities` is optional
//! and only used to label devices.
//!
//! # Channel layout
//! Axes (6), all normalized to `[-1.0, 1.0]`:
//! - `0`: left stick X
//! - `1`: left stick Y, **inverted** (up = -1, down = +1)
//! - `2`: right stick X
//! - `3`: right stick Y, **inverted**
//! - `4`: left trigger, released `-1.0` to fully pressed `+1.0`
//! - `5`: right trigger, same mapping
//!
//! Buttons (10): A, B, X, Y, LB, RB, Back, Start, LThumb, RThumb.
//!
//! Hat (1): the D-pad. Conflicting directions (up + down, left + right) read
//! as centered.

use std::ffi::CStr;

use windows_sys::Win32::Foundation::{ERROR_DEVICE_NOT_CONNECTED, ERROR_SUCCESS};
use windows_sys::Win32::UI::Input::XboxController::{
    XINPUT_CAPABILITIES, XINPUT_DEVSUBTYPE, XINPUT_DEVSUBTYPE_ARCADE_PAD,
    XINPUT_DEVSUBTYPE_ARCADE_STICK, XINPUT_DEVSUBTYPE_DANCE_PAD, XINPUT_DEVSUBTYPE_DRUM_KIT,
    XINPUT_DEVSUBTYPE_FLIGHT_STICK, XINPUT_DEVSUBTYPE_GAMEPAD, XINPUT_DEVSUBTYPE_GUITAR,
    XINPUT_DEVSUBTYPE_GUITAR_ALTERNATE, XINPUT_DEVSUBTYPE_GUITAR_BASS, XINPUT_DEVSUBTYPE_WHEEL,
    XINPUT_FLAG, XINPUT_FLAG_GAMEPAD, XINPUT_GAMEPAD, XINPUT_GAMEPAD_A, XINPUT_GAMEPAD_B,
    XINPUT_GAMEPAD_BACK, XINPUT_GAMEPAD_BUTTON_FLAGS, XINPUT_GAMEPAD_DPAD_DOWN,
    XINPUT_GAMEPAD_DPAD_LEFT, XINPUT_GAMEPAD_DPAD_RIGHT, XINPUT_GAMEPAD_DPAD_UP,
    XINPUT_GAMEPAD_LEFT_SHOULDER, XINPUT_GAMEPAD_LEFT_THUMB, XINPUT_GAMEPAD_RIGHT_SHOULDER,
    XINPUT_GAMEPAD_RIGHT_THUMB, XINPUT_GAMEPAD_START, XINPUT_GAMEPAD_X, XINPUT_GAMEPAD_Y,
    XINPUT_STATE, XINPUT_VIBRATION, XUSER_MAX_COUNT,
};

use crate::device::{Backend, BackendKind, DeviceKey};
use crate::error::{InitError, ReadError};
use crate::hat::HatState;
use crate::library::{typed_symbol, NativeLibrary};
use crate::metadata::DeviceMeta;
use crate::state::{normalize_thumb, normalize_trigger, GamepadState};

/// Button bit → button index. Indices must stay stable.
const BUTTON_MAP: [XINPUT_GAMEPAD_BUTTON_FLAGS; 10] = [
    XINPUT_GAMEPAD_A,
    XINPUT_GAMEPAD_B,
    XINPUT_GAMEPAD_X,
    XINPUT_GAMEPAD_Y,
    XINPUT_GAMEPAD_LEFT_SHOULDER,
    XINPUT_GAMEPAD_RIGHT_SHOULDER,
    XINPUT_GAMEPAD_BACK,
    XINPUT_GAMEPAD_START,
    XINPUT_GAMEPAD_LEFT_THUMB,
    XINPUT_GAMEPAD_RIGHT_THUMB,
];

pub type XInputGetStateFn = unsafe extern "system" fn(u32, *mut XINPUT_STATE) -> u32;
pub type XInputGetCapabilitiesFn =
    unsafe extern "system" fn(u32, XINPUT_FLAG, *mut XINPUT_CAPABILITIES) -> u32;

/// A gamepad report with nothing pressed and both sticks centered.
pub const fn idle_gamepad() -> XINPUT_GAMEPAD {
    XINPUT_GAMEPAD {
        wButtons: 0,
        bLeftTrigger: 0,
        bRightTrigger: 0,
        sThumbLX: 0,
        sThumbLY: 0,
        sThumbRX: 0,
        sThumbRY: 0,
    }
}

fn empty_capabilities() -> XINPUT_CAPABILITIES {
    XINPUT_CAPABILITIES {
        Type: 0,
        SubType: 0,
        Flags: 0,
        Gamepad: idle_gamepad(),
        Vibration: XINPUT_VIBRATION {
            wLeftMotorSpeed: 0,
            wRightMotorSpeed: 0,
        },
    }
}

const GET_STATE: &CStr = c"XInputGetState";
const GET_CAPABILITIES: &CStr = c"XInputGetCapabilities";

/// Human-readable name for an `XINPUT_DEVSUBTYPE_*` value.
fn subtype_name(sub_type: XINPUT_DEVSUBTYPE) -> &'static str {
    match sub_type {
        XINPUT_DEVSUBTYPE_GAMEPAD => "Gamepad",
        XINPUT_DEVSUBTYPE_WHEEL => "Wheel",
        XINPUT_DEVSUBTYPE_ARCADE_STICK => "Arcade Stick",
        XINPUT_DEVSUBTYPE_FLIGHT_STICK => "Flight Stick",
        XINPUT_DEVSUBTYPE_DANCE_PAD => "Dance Pad",
        XINPUT_DEVSUBTYPE_GUITAR | XINPUT_DEVSUBTYPE_GUITAR_ALTERNATE
        | XINPUT_DEVSUBTYPE_GUITAR_BASS => "Guitar",
        XINPUT_DEVSUBTYPE_DRUM_KIT => "Drum Kit",
        XINPUT_DEVSUBTYPE_ARCADE_PAD => "Arcade Pad",
        _ => "Controller",
    }
}

/// Convert one raw XInput packet into the uniform snapshot.
pub fn map_gamepad(gp: &XINPUT_GAMEPAD) -> GamepadState {
    let axes = vec![
        normalize_thumb(gp.sThumbLX),
        -normalize_thumb(gp.sThumbLY),
        normalize_thumb(gp.sThumbRX),
        -normalize_thumb(gp.sThumbRY),
        normalize_trigger(gp.bLeftTrigger),
        normalize_trigger(gp.bRightTrigger),
    ];
    let pressed = |mask: XINPUT_GAMEPAD_BUTTON_FLAGS| gp.wButtons & mask != 0;
    let buttons = BUTTON_MAP.iter().map(|&mask| pressed(mask)).collect();
    let hat = HatState::from_dpad(
        pressed(XINPUT_GAMEPAD_DPAD_UP),
        pressed(XINPUT_GAMEPAD_DPAD_DOWN),
        pressed(XINPUT_GAMEPAD_DPAD_LEFT),
        pressed(XINPUT_GAMEPAD_DPAD_RIGHT),
    );
    GamepadState::new(axes, buttons, vec![hat])
}

/// Slot-based XInput reader. Owns the library its entry points came from.
pub struct XInputBackend<L: NativeLibrary> {
    get_state: XInputGetStateFn,
    get_capabilities: Option<XInputGetCapabilitiesFn>,
    library: L,
}

impl<L: NativeLibrary> XInputBackend<L> {
    /// Bind the entry points of an already loaded XInput library.
    pub fn open(library: L) -> Result<Self, InitError> {
        // SAFETY: both aliases match the documented XInput signatures.
        let get_state: XInputGetStateFn = unsafe { typed_symbol(&library, GET_STATE) }
            .ok_or_else(|| InitError::MissingEntryPoint {
                library: library.name().to_string(),
                symbol: "XInputGetState".to_string(),
            })?;
        let get_capabilities: Option<XInputGetCapabilitiesFn> =
            unsafe { typed_symbol(&library, GET_CAPABILITIES) };
        if get_capabilities.is_none() {
            log::debug!("[xinput] {} has no XInputGetCapabilities", library.name());
        }
        Ok(Self {
            get_state,
            get_capabilities,
            library,
        })
    }

    fn raw_state(&self, slot: u32) -> Result<XINPUT_STATE, ReadError> {
        let mut state = XINPUT_STATE {
            dwPacketNumber: 0,
            Gamepad: idle_gamepad(),
        };
        // SAFETY: `state` is a valid out-parameter for the duration of the call.
        match unsafe { (self.get_state)(slot, &mut state) } {
            ERROR_SUCCESS => Ok(state),
            ERROR_DEVICE_NOT_CONNECTED => Err(ReadError::Disconnected),
            code => Err(ReadError::Status(code as i32)),
        }
    }

    fn product_name(&self, slot: u32) -> String {
        let Some(get_caps) = self.get_capabilities else {
            return format!("XInput Controller {slot}");
        };
        let mut caps = empty_capabilities();
        // SAFETY: `caps` is a valid out-parameter for the duration of the call.
        if unsafe { get_caps(slot, XINPUT_FLAG_GAMEPAD, &mut caps) } == ERROR_SUCCESS {
            format!("XInput {} {slot}", subtype_name(caps.SubType))
        } else {
            format!("XInput Controller {slot}")
        }
    }
}

impl<L: NativeLibrary> Backend for XInputBackend<L> {
    fn kind(&self) -> BackendKind {
        BackendKind::XInput
    }

    fn library(&self) -> Option<&str> {
        Some(self.library.name())
    }

    fn scan(&mut self) -> Result<Vec<(DeviceKey, DeviceMeta)>, ReadError> {
        let mut found = Vec::new();
        for slot in 0..XUSER_MAX_COUNT {
            match self.raw_state(slot) {
                Ok(_) => {
                    let meta = DeviceMeta::for_slot("xinput", slot, self.product_name(slot));
                    found.push((DeviceKey::Slot(slot), meta));
                }
                Err(ReadError::Disconnected) => {}
                Err(e) => log::debug!("[xinput] slot {slot}: {e}"),
            }
        }
        Ok(found)
    }

    fn read(&mut self, key: &DeviceKey) -> Result<GamepadState, ReadError> {
        match *key {
            DeviceKey::Slot(slot) if slot < XUSER_MAX_COUNT => {
                self.raw_state(slot).map(|s| map_gamepad(&s.Gamepad))
            }
            _ => Err(ReadError::Disconnected),
        }
    }
}
