//! DirectInput 8 COM interop.
//!
//! Structures, flags and object GUIDs come from `windows-sys`. What it does not
//! provide lives here: the interface vtables, [`ComPtr`], the `DIJOFS_*`
//! offsets and the few `DIDFT_*` bits it omits.
//!
//! Interfaces are reached through their virtual function tables, never through
//! named exports. Each vtable below reproduces the native slot order exactly;
//! slots this crate never calls are kept as opaque `usize` placeholders so the
//! layout stays correct without typing signatures nobody uses.
//!
//! [`ComPtr`] owns one reference and releases it exactly once on drop. Every
//! native call is wrapped in a narrow method on `ComPtr<...>` so the rest of
//! the crate never touches raw vtable pointers.

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr::{self, NonNull};

use windows_sys::core::{GUID, HRESULT};
use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    GUID_RxAxis, GUID_RyAxis, GUID_RzAxis, GUID_Slider, GUID_XAxis, GUID_YAxis, GUID_ZAxis,
    DIDATAFORMAT, DIDEVICEINSTANCEW, DIDEVICEOBJECTINSTANCEW, DIDFT_ANYINSTANCE, DIDFT_AXIS,
    DIDFT_BUTTON, DIDFT_POV, DIDF_ABSAXIS, DIDOI_ASPECTPOSITION, DIENUM_CONTINUE, DIJOYSTATE,
    DIOBJECTDATAFORMAT, DIPH_BYID, DIPH_DEVICE, DIPROPAXISMODE_ABS, DIPROPDWORD, DIPROPHEADER,
    DIPROPRANGE, DIPROP_AXISMODE, DIPROP_RANGE, GUID_POV, LPDIENUMDEVICEOBJECTSCALLBACKW,
    LPDIENUMDEVICESCALLBACKW,
};
use windows_sys::Win32::Foundation::BOOL;

pub const DIDFT_OPTIONAL: u32 = 0x8000_0000;
pub const DIDFT_TYPEMASK: u32 = 0x0000_00FF;

pub const JOYSTATE_SIZE: usize = size_of::<DIJOYSTATE>();

#[inline]
pub fn succeeded(hr: HRESULT) -> bool {
    hr >= 0
}

#[inline]
pub fn didft_get_type(dw_type: u32) -> u32 {
    dw_type & DIDFT_TYPEMASK
}

/// `MAKEDIPROP`: predefined properties are passed as small integers in the
/// `REFGUID` slot. `windows-sys` stores that integer in the low bytes.
#[inline]
fn makediprop(prop: GUID) -> *const GUID {
    u64::from_be_bytes(prop.data4) as usize as *const GUID
}

// ---------------------------------------------------------------------------
// DIJOYSTATE
// ---------------------------------------------------------------------------

pub const DIJOFS_X: u32 = 0;
pub const DIJOFS_Y: u32 = 4;
pub const DIJOFS_Z: u32 = 8;
pub const DIJOFS_RX: u32 = 12;
pub const DIJOFS_RY: u32 = 16;
pub const DIJOFS_RZ: u32 = 20;

#[inline]
pub const fn dijofs_slider(n: u32) -> u32 {
    24 + n * 4
}

#[inline]
pub const fn dijofs_pov(n: u32) -> u32 {
    32 + n * 4
}

#[inline]
pub const fn dijofs_button(n: u32) -> u32 {
    48 + n
}

/// All axes at rest, every POV centered, no buttons.
pub fn empty_joystate() -> DIJOYSTATE {
    DIJOYSTATE {
        lX: 0,
        lY: 0,
        lZ: 0,
        lRx: 0,
        lRy: 0,
        lRz: 0,
        rglSlider: [0; 2],
        rgdwPOV: [u32::MAX; 4],
        rgbButtons: [0; 32],
    }
}

/// The `i32` axis stored at byte `offset`.
pub fn axis_at(state: &DIJOYSTATE, offset: u32) -> i32 {
    match offset {
        DIJOFS_X => state.lX,
        DIJOFS_Y => state.lY,
        DIJOFS_Z => state.lZ,
        DIJOFS_RX => state.lRx,
        DIJOFS_RY => state.lRy,
        DIJOFS_RZ => state.lRz,
        o if o == dijofs_slider(0) => state.rglSlider[0],
        o if o == dijofs_slider(1) => state.rglSlider[1],
        _ => 0,
    }
}

pub fn pov_at(state: &DIJOYSTATE, offset: u32) -> u32 {
    let idx = offset.wrapping_sub(dijofs_pov(0)) / 4;
    state.rgdwPOV.get(idx as usize).copied().unwrap_or(u32::MAX)
}

pub fn button_at(state: &DIJOYSTATE, offset: u32) -> bool {
    let idx = offset.wrapping_sub(dijofs_button(0));
    state
        .rgbButtons
        .get(idx as usize)
        .is_some_and(|b| b & 0x80 != 0)
}

static AXIS_GUIDS: [GUID; 6] = [
    GUID_XAxis,
    GUID_YAxis,
    GUID_ZAxis,
    GUID_RxAxis,
    GUID_RyAxis,
    GUID_RzAxis,
];
static SLIDER_GUID: GUID = GUID_Slider;
static POV_GUID: GUID = GUID_POV;

/// Object table for the `DIJOYSTATE` layout: 6 axes, 2 sliders, 4 POVs, 32 buttons.
///
/// DirectInput copies the table during `SetDataFormat`, so the returned vector
/// only has to outlive that call.
pub fn joystate_objects() -> Vec<DIOBJECTDATAFORMAT> {
    let axis_type = DIDFT_AXIS | DIDFT_OPTIONAL | DIDFT_ANYINSTANCE;
    let mut out = Vec::with_capacity(44);

    for (i, guid) in AXIS_GUIDS.iter().enumerate() {
        out.push(DIOBJECTDATAFORMAT {
            pguid: guid,
            dwOfs: i as u32 * 4,
            dwType: axis_type,
            dwFlags: DIDOI_ASPECTPOSITION,
        });
    }
    for n in 0..2 {
        out.push(DIOBJECTDATAFORMAT {
            pguid: &SLIDER_GUID,
            dwOfs: dijofs_slider(n),
            dwType: axis_type,
            dwFlags: DIDOI_ASPECTPOSITION,
        });
    }
    for n in 0..4 {
        out.push(DIOBJECTDATAFORMAT {
            pguid: &POV_GUID,
            dwOfs: dijofs_pov(n),
            dwType: DIDFT_POV | DIDFT_OPTIONAL | DIDFT_ANYINSTANCE,
            dwFlags: 0,
        });
    }
    for n in 0..32 {
        out.push(DIOBJECTDATAFORMAT {
            pguid: ptr::null(),
            dwOfs: dijofs_button(n),
            dwType: DIDFT_BUTTON | DIDFT_OPTIONAL | DIDFT_ANYINSTANCE,
            dwFlags: 0,
        });
    }
    out
}

pub fn joystate_format(objects: &mut [DIOBJECTDATAFORMAT]) -> DIDATAFORMAT {
    DIDATAFORMAT {
        dwSize: size_of::<DIDATAFORMAT>() as u32,
        dwObjSize: size_of::<DIOBJECTDATAFORMAT>() as u32,
        dwFlags: DIDF_ABSAXIS,
        dwDataSize: JOYSTATE_SIZE as u32,
        dwNumObjs: objects.len() as u32,
        rgodf: objects.as_mut_ptr(),
    }
}

// ---------------------------------------------------------------------------
// Interfaces
// ---------------------------------------------------------------------------

/// `IDirectInput8W` vtable.
#[repr(C)]
pub struct IDirectInput8WVtbl {
    pub query_interface: usize,
    pub add_ref: usize,
    pub release: unsafe extern "system" fn(*mut IDirectInput8W) -> u32,
    pub create_device: unsafe extern "system" fn(
        *mut IDirectInput8W,
        *const GUID,
        *mut *mut IDirectInputDevice8W,
        *mut c_void,
    ) -> HRESULT,
    pub enum_devices: unsafe extern "system" fn(
        *mut IDirectInput8W,
        u32,
        LPDIENUMDEVICESCALLBACKW,
        *mut c_void,
        u32,
    ) -> HRESULT,
    pub get_device_status: usize,
    pub run_control_panel: usize,
    pub initialize: usize,
    pub find_device: usize,
    pub enum_devices_by_semantics: usize,
    pub configure_devices: usize,
}

#[repr(C)]
pub struct IDirectInput8W {
    pub vtbl: *const IDirectInput8WVtbl,
}

/// `IDirectInputDevice8W` vtable.
#[repr(C)]
pub struct IDirectInputDevice8WVtbl {
    pub query_interface: usize,
    pub add_ref: usize,
    pub release: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> u32,
    pub get_capabilities: usize,
    pub enum_objects: unsafe extern "system" fn(
        *mut IDirectInputDevice8W,
        LPDIENUMDEVICEOBJECTSCALLBACKW,
        *mut c_void,
        u32,
    ) -> HRESULT,
    pub get_property: usize,
    pub set_property: unsafe extern "system" fn(
        *mut IDirectInputDevice8W,
        *const GUID,
        *const DIPROPHEADER,
    ) -> HRESULT,
    pub acquire: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> HRESULT,
    pub unacquire: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> HRESULT,
    pub get_device_state:
        unsafe extern "system" fn(*mut IDirectInputDevice8W, u32, *mut c_void) -> HRESULT,
    pub get_device_data: usize,
    pub set_data_format:
        unsafe extern "system" fn(*mut IDirectInputDevice8W, *const DIDATAFORMAT) -> HRESULT,
    pub set_event_notification: usize,
    pub set_cooperative_level: usize,
    pub get_object_info: usize,
    pub get_device_info: usize,
    pub run_control_panel: usize,
    pub initialize: usize,
    pub create_effect: usize,
    pub enum_effects: usize,
    pub get_effect_info: usize,
    pub get_force_feedback_state: usize,
    pub send_force_feedback_command: usize,
    pub enum_created_effect_objects: usize,
    pub escape: usize,
    pub poll: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> HRESULT,
    pub send_device_data: usize,
    pub enum_effects_in_file: usize,
    pub write_effect_to_file: usize,
    pub build_action_map: usize,
    pub set_action_map: usize,
    pub get_image_info: usize,
}

#[repr(C)]
pub struct IDirectInputDevice8W {
    pub vtbl: *const IDirectInputDevice8WVtbl,
}

/// A COM interface that can be released.
pub trait ComInterface {
    /// # Safety
    /// `this` must point to a live object of this interface holding at least one reference.
    unsafe fn release(this: NonNull<Self>) -> u32;
}

impl ComInterface for IDirectInput8W {
    unsafe fn release(this: NonNull<Self>) -> u32 {
        let p = this.as_ptr();
        ((*(*p).vtbl).release)(p)
    }
}

impl ComInterface for IDirectInputDevice8W {
    unsafe fn release(this: NonNull<Self>) -> u32 {
        let p = this.as_ptr();
        ((*(*p).vtbl).release)(p)
    }
}

/// Owning interface pointer. Releases its reference exactly once on drop.
pub struct ComPtr<T: ComInterface> {
    ptr: NonNull<T>,
}

impl<T: ComInterface> ComPtr<T> {
    /// Take ownership of one reference.
    ///
    /// # Safety
    /// `raw` must be null or a valid interface pointer whose reference the caller transfers.
    pub unsafe fn from_raw(raw: *mut T) -> Option<Self> {
        NonNull::new(raw).map(|ptr| Self { ptr })
    }

    #[inline]
    pub fn as_raw(&self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<T: ComInterface> Drop for ComPtr<T> {
    fn drop(&mut self) {
        // SAFETY: we own exactly one reference, acquired in `from_raw`.
        unsafe {
            T::release(self.ptr);
        }
    }
}

impl<T: ComInterface> std::fmt::Debug for ComPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComPtr({:p})", self.ptr)
    }
}

/// Shared body of the `EnumDevices`/`EnumObjects` callbacks: copy the
/// reported record into the `Vec<T>` behind `ctx`.
unsafe fn collect_into<T: Copy>(item: *mut T, ctx: *mut c_void) -> BOOL {
    let out = &mut *(ctx as *mut Vec<T>);
    if let Some(item) = item.as_ref() {
        out.push(*item);
    }
    DIENUM_CONTINUE as BOOL
}

#[inline]
fn hr_result<T>(hr: HRESULT, value: T) -> Result<T, HRESULT> {
    if succeeded(hr) {
        Ok(value)
    } else {
        Err(hr)
    }
}

impl ComPtr<IDirectInput8W> {
    #[inline]
    fn vtbl(&self) -> &IDirectInput8WVtbl {
        // SAFETY: a live interface always carries a valid vtable pointer.
        unsafe { &*(*self.as_raw()).vtbl }
    }

    /// `IDirectInput8::EnumDevices` collecting every reported instance.
    pub fn enum_devices(
        &self,
        class: u32,
        flags: u32,
    ) -> Result<Vec<DIDEVICEINSTANCEW>, HRESULT> {
        unsafe extern "system" fn collect(inst: *mut DIDEVICEINSTANCEW, ctx: *mut c_void) -> BOOL {
            collect_into(inst, ctx)
        }

        let mut found: Vec<DIDEVICEINSTANCEW> = Vec::new();
        // SAFETY: `found` outlives the call and matches what `collect` casts `ctx` to.
        let hr = unsafe {
            (self.vtbl().enum_devices)(
                self.as_raw(),
                class,
                Some(collect),
                &mut found as *mut Vec<DIDEVICEINSTANCEW> as *mut c_void,
                flags,
            )
        };
        hr_result(hr, found)
    }

    /// `IDirectInput8::CreateDevice`.
    pub fn create_device(
        &self,
        instance: &GUID,
    ) -> Result<ComPtr<IDirectInputDevice8W>, HRESULT> {
        let mut out: *mut IDirectInputDevice8W = ptr::null_mut();
        let hr = unsafe {
            (self.vtbl().create_device)(self.as_raw(), instance, &mut out, ptr::null_mut())
        };
        if !succeeded(hr) {
            return Err(hr);
        }
        // SAFETY: on success the out slot holds a new reference we now own.
        unsafe { ComPtr::from_raw(out) }.ok_or(hr)
    }
}

impl ComPtr<IDirectInputDevice8W> {
    #[inline]
    fn vtbl(&self) -> &IDirectInputDevice8WVtbl {
        // SAFETY: a live interface always carries a valid vtable pointer.
        unsafe { &*(*self.as_raw()).vtbl }
    }

    pub fn set_data_format(&self, format: &DIDATAFORMAT) -> HRESULT {
        unsafe { (self.vtbl().set_data_format)(self.as_raw(), format) }
    }

    /// Switch every axis to absolute reporting.
    pub fn set_absolute_axis_mode(&self) -> HRESULT {
        let prop = DIPROPDWORD {
            diph: DIPROPHEADER {
                dwSize: size_of::<DIPROPDWORD>() as u32,
                dwHeaderSize: size_of::<DIPROPHEADER>() as u32,
                dwObj: 0,
                dwHow: DIPH_DEVICE,
            },
            dwData: DIPROPAXISMODE_ABS,
        };
        unsafe {
            (self.vtbl().set_property)(self.as_raw(), makediprop(DIPROP_AXISMODE), &prop.diph)
        }
    }

    /// Set the logical range of the object identified by `object_type` (`DIPH_BYID`).
    pub fn set_axis_range(&self, object_type: u32, min: i32, max: i32) -> HRESULT {
        let prop = DIPROPRANGE {
            diph: DIPROPHEADER {
                dwSize: size_of::<DIPROPRANGE>() as u32,
                dwHeaderSize: size_of::<DIPROPHEADER>() as u32,
                dwObj: object_type,
                dwHow: DIPH_BYID,
            },
            lMin: min,
            lMax: max,
        };
        unsafe {
            (self.vtbl().set_property)(self.as_raw(), makediprop(DIPROP_RANGE), &prop.diph)
        }
    }

    /// `EnumObjects` over `flags`, collecting every object instance.
    pub fn enum_objects(&self, flags: u32) -> Result<Vec<DIDEVICEOBJECTINSTANCEW>, HRESULT> {
        unsafe extern "system" fn collect(
            obj: *mut DIDEVICEOBJECTINSTANCEW,
            ctx: *mut c_void,
        ) -> BOOL {
            collect_into(obj, ctx)
        }

        let mut found: Vec<DIDEVICEOBJECTINSTANCEW> = Vec::new();
        // SAFETY: `found` outlives the call and matches what `collect` casts `ctx` to.
        let hr = unsafe {
            (self.vtbl().enum_objects)(
                self.as_raw(),
                Some(collect),
                &mut found as *mut Vec<DIDEVICEOBJECTINSTANCEW> as *mut c_void,
                flags,
            )
        };
        hr_result(hr, found)
    }

    pub fn acquire(&self) -> HRESULT {
        unsafe { (self.vtbl().acquire)(self.as_raw()) }
    }

    pub fn unacquire(&self) -> HRESULT {
        unsafe { (self.vtbl().unacquire)(self.as_raw()) }
    }

    pub fn poll(&self) -> HRESULT {
        unsafe { (self.vtbl().poll)(self.as_raw()) }
    }

    pub fn get_joy_state(&self, state: &mut DIJOYSTATE) -> HRESULT {
        unsafe {
            (self.vtbl().get_device_state)(
                self.as_raw(),
                JOYSTATE_SIZE as u32,
                state as *mut DIJOYSTATE as *mut c_void,
            )
        }
    }
}

/// Decode a NUL-terminated UTF-16 buffer.
pub fn wide_to_string(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}
