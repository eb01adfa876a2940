//! In-process stand-ins for native libraries, used by unit tests.
//!
//! [`FakePlatform`] serves named libraries whose exports are real
//! `extern "system"` functions defined here. The DirectInput factory hands out
//! heap-allocated objects with genuine vtables, so the production interop code
//! runs unmodified against them. All scripted state is thread-local; every test
//! gets a clean slate because libtest runs each test on its own thread.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use windows_sys::core::{GUID, HRESULT};
use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    DI8DEVCLASS_GAMECTRL, DIDATAFORMAT, DIDEVICEINSTANCEW, DIDEVICEOBJECTINSTANCEW, DIDFT_ABSAXIS,
    DIDFT_ALL, DIDFT_POV, DIDFT_PSHBUTTON, DIEDFL_ATTACHEDONLY, DIENUM_STOP, DIERR_INPUTLOST,
    DIERR_NOTACQUIRED, DIJOYSTATE, DIPROPHEADER, DI_OK, LPDIENUMDEVICEOBJECTSCALLBACKW,
    LPDIENUMDEVICESCALLBACKW,
};
use windows_sys::Win32::Foundation::{
    ERROR_BAD_ARGUMENTS, ERROR_DEVICE_NOT_CONNECTED, ERROR_SUCCESS, E_FAIL, E_INVALIDARG,
};
use windows_sys::Win32::UI::Input::XboxController::{
    XINPUT_CAPABILITIES, XINPUT_DEVSUBTYPE_GAMEPAD, XINPUT_DEVTYPE_GAMEPAD, XINPUT_FLAG,
    XINPUT_GAMEPAD, XINPUT_STATE, XINPUT_VIBRATION, XUSER_MAX_COUNT,
};

use crate::backends::xinput::{idle_gamepad, XInputGetCapabilitiesFn, XInputGetStateFn};
use crate::com::{
    didft_get_type, dijofs_button, dijofs_pov, dijofs_slider, empty_joystate, IDirectInput8W,
    IDirectInput8WVtbl, IDirectInputDevice8W, IDirectInputDevice8WVtbl, JOYSTATE_SIZE,
};
use crate::guid::Guid;
use crate::interface::FactoryFn;
use crate::library::{LibraryLoader, NativeLibrary};
use crate::platform::{ModuleHandle, Platform, XInputProducts};

/// Module handle the fake platform reports for the current process.
pub const FAKE_MODULE: *mut c_void = 0x1000_0000 as *mut c_void;

const DIERR_DEVICENOTREG: HRESULT = 0x8004_0154_u32 as i32;
const DIPROP_RANGE_ID: usize = 4;

pub type FakeSymbol = (&'static CStr, *mut c_void);

// ---------------------------------------------------------------------------
// Thread-local script
// ---------------------------------------------------------------------------

/// How the fake `DirectInput8Create` behaves on its next call.
#[derive(Clone, Copy, Debug)]
pub struct FactoryScript {
    pub hresult: HRESULT,
    pub last_error: u32,
    pub produce_object: bool,
}

impl Default for FactoryScript {
    fn default() -> Self {
        Self {
            hresult: DI_OK,
            last_error: ERROR_SUCCESS,
            produce_object: true,
        }
    }
}

/// Arguments observed by the fake factory.
#[derive(Clone, Copy, Debug)]
pub struct FactoryCallRecord {
    pub hinstance: *mut c_void,
    pub version: u32,
    pub iid: Guid,
    pub out_was_zeroed: bool,
}

thread_local! {
    static LAST_ERROR: Cell<u32> = const { Cell::new(0) };
    static FACTORY: Cell<FactoryScript> = Cell::new(FactoryScript::default());
    static LAST_CALL: Cell<Option<FactoryCallRecord>> = const { Cell::new(None) };
    static FACTORY_CALLS: Cell<u32> = const { Cell::new(0) };
    static RELEASES: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    static DEVICES: RefCell<Vec<FakeDevice>> = const { RefCell::new(Vec::new()) };
    static NEXT_INSTANCE: Cell<u32> = const { Cell::new(1) };
    static XINPUT_SLOTS: RefCell<[Option<XINPUT_GAMEPAD>; 4]> = const { RefCell::new([None; 4]) };
    static XINPUT_PRODUCTS: RefCell<HashSet<u32>> = RefCell::new(HashSet::new());
}

pub fn script_factory(script: FactoryScript) {
    FACTORY.set(script);
}

pub fn last_factory_call() -> Option<FactoryCallRecord> {
    LAST_CALL.get()
}

pub fn factory_calls() -> u32 {
    FACTORY_CALLS.get()
}

/// Every `Release` that destroyed a fake object, in order.
pub fn release_log() -> Vec<&'static str> {
    RELEASES.with_borrow(|r| r.clone())
}

pub fn direct_input_releases() -> usize {
    release_log().iter().filter(|r| **r == "direct_input").count()
}

pub fn device_releases() -> usize {
    release_log().iter().filter(|r| **r == "device").count()
}

pub fn set_xinput_slot(slot: u32, pad: Option<XINPUT_GAMEPAD>) {
    XINPUT_SLOTS.with_borrow_mut(|s| s[slot as usize] = pad);
}

/// Mark `(vid, pid)` pairs as served by XInput.
pub fn set_xinput_products(products: &[(u16, u16)]) {
    XINPUT_PRODUCTS.with_borrow_mut(|p| {
        p.clear();
        p.extend(
            products
                .iter()
                .map(|&(vid, pid)| u32::from(pid) << 16 | u32::from(vid)),
        );
    });
}

fn fake_xinput_products() -> HashSet<u32> {
    XINPUT_PRODUCTS.with_borrow(|p| p.clone())
}

// ---------------------------------------------------------------------------
// Platform and libraries
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct FakeLibrary {
    name: String,
    symbols: Vec<FakeSymbol>,
}

impl NativeLibrary for FakeLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        self.symbols
            .iter()
            .find(|(s, _)| *s == name)
            .and_then(|(_, p)| NonNull::new(*p))
    }
}

#[derive(Debug)]
pub struct FakePlatform {
    libraries: HashMap<String, Vec<FakeSymbol>>,
    attempts: RefCell<Vec<String>>,
    module: Option<ModuleHandle>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            libraries: HashMap::new(),
            attempts: RefCell::new(Vec::new()),
            module: ModuleHandle::new(FAKE_MODULE),
        }
    }

    pub fn with_library(mut self, name: &str, symbols: &[FakeSymbol]) -> Self {
        self.libraries.insert(name.to_string(), symbols.to_vec());
        self
    }

    /// `dinput8.dll` exporting the fake factory.
    pub fn with_directinput() -> Self {
        Self::new().with_directinput_library()
    }

    pub fn with_directinput_library(self) -> Self {
        let factory = fake_direct_input8_create as FactoryFn;
        self.with_library(
            "dinput8.dll",
            &[(c"DirectInput8Create", factory as *mut c_void)],
        )
    }

    /// `xinput1_4.dll` exporting both XInput entry points.
    pub fn with_xinput() -> Self {
        Self::new().with_xinput_library()
    }

    pub fn with_xinput_library(self) -> Self {
        let caps = fake_xinput_get_capabilities as XInputGetCapabilitiesFn;
        self.with_library(
            "xinput1_4.dll",
            &[
                (c"XInputGetState", fake_xinput_get_state()),
                (c"XInputGetCapabilities", caps as *mut c_void),
            ],
        )
    }

    pub fn without_module(mut self) -> Self {
        self.module = None;
        self
    }

    /// Load a registered library without recording an attempt.
    pub fn load_for_test(&self, name: &str) -> FakeLibrary {
        let symbols = self
            .libraries
            .get(name)
            .unwrap_or_else(|| panic!("{name} not registered"));
        FakeLibrary {
            name: name.to_string(),
            symbols: symbols.clone(),
        }
    }

    pub fn load_attempts(&self) -> Vec<String> {
        self.attempts.borrow().clone()
    }
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryLoader for FakePlatform {
    type Library = FakeLibrary;

    fn load(&self, name: &str) -> Option<FakeLibrary> {
        self.attempts.borrow_mut().push(name.to_string());
        self.libraries.get(name).map(|symbols| FakeLibrary {
            name: name.to_string(),
            symbols: symbols.clone(),
        })
    }
}

impl Platform for FakePlatform {
    fn current_module(&self) -> Option<ModuleHandle> {
        self.module
    }

    fn clear_last_error(&self) {
        LAST_ERROR.set(0);
    }

    fn last_error(&self) -> u32 {
        LAST_ERROR.get()
    }

    fn xinput_products(&self) -> XInputProducts {
        fake_xinput_products
    }
}

// ---------------------------------------------------------------------------
// XInput exports
// ---------------------------------------------------------------------------

pub fn fake_xinput_get_state() -> *mut c_void {
    let f = xinput_get_state as XInputGetStateFn;
    f as *mut c_void
}

unsafe extern "system" fn xinput_get_state(slot: u32, out: *mut XINPUT_STATE) -> u32 {
    if slot >= XUSER_MAX_COUNT {
        return ERROR_BAD_ARGUMENTS;
    }
    match XINPUT_SLOTS.with_borrow(|s| s[slot as usize]) {
        Some(gamepad) => {
            *out = XINPUT_STATE {
                dwPacketNumber: 1,
                Gamepad: gamepad,
            };
            ERROR_SUCCESS
        }
        None => ERROR_DEVICE_NOT_CONNECTED,
    }
}

unsafe extern "system" fn fake_xinput_get_capabilities(
    slot: u32,
    _flags: XINPUT_FLAG,
    out: *mut XINPUT_CAPABILITIES,
) -> u32 {
    if slot >= XUSER_MAX_COUNT {
        return ERROR_BAD_ARGUMENTS;
    }
    if XINPUT_SLOTS.with_borrow(|s| s[slot as usize].is_none()) {
        return ERROR_DEVICE_NOT_CONNECTED;
    }
    *out = XINPUT_CAPABILITIES {
        Type: XINPUT_DEVTYPE_GAMEPAD,
        SubType: XINPUT_DEVSUBTYPE_GAMEPAD,
        Flags: 0,
        Gamepad: idle_gamepad(),
        Vibration: XINPUT_VIBRATION {
            wLeftMotorSpeed: 0,
            wRightMotorSpeed: 0,
        },
    };
    ERROR_SUCCESS
}

// ---------------------------------------------------------------------------
// DirectInput factory and objects
// ---------------------------------------------------------------------------

unsafe extern "system" fn fake_direct_input8_create(
    hinstance: *mut c_void,
    version: u32,
    iid: *const GUID,
    out: *mut *mut c_void,
    _outer: *mut c_void,
) -> HRESULT {
    LAST_CALL.set(Some(FactoryCallRecord {
        hinstance,
        version,
        iid: Guid(*iid),
        out_was_zeroed: !out.is_null() && (*out).is_null(),
    }));
    FACTORY_CALLS.set(FACTORY_CALLS.get() + 1);

    let script = FACTORY.get();
    LAST_ERROR.set(script.last_error);
    if script.produce_object && !out.is_null() {
        let obj = Box::new(FakeDirectInput {
            iface: IDirectInput8W {
                vtbl: &DIRECT_INPUT_VTBL,
            },
        });
        *out = Box::into_raw(obj) as *mut c_void;
    }
    script.hresult
}

#[repr(C)]
struct FakeDirectInput {
    iface: IDirectInput8W,
}

static DIRECT_INPUT_VTBL: IDirectInput8WVtbl = IDirectInput8WVtbl {
    query_interface: 0,
    add_ref: 0,
    release: di_release,
    create_device: di_create_device,
    enum_devices: di_enum_devices,
    get_device_status: 0,
    run_control_panel: 0,
    initialize: 0,
    find_device: 0,
    enum_devices_by_semantics: 0,
    configure_devices: 0,
};

unsafe extern "system" fn di_release(this: *mut IDirectInput8W) -> u32 {
    drop(Box::from_raw(this as *mut FakeDirectInput));
    RELEASES.with_borrow_mut(|r| r.push("direct_input"));
    0
}

unsafe extern "system" fn di_enum_devices(
    _this: *mut IDirectInput8W,
    class: u32,
    callback: LPDIENUMDEVICESCALLBACKW,
    ctx: *mut c_void,
    flags: u32,
) -> HRESULT {
    let Some(callback) = callback else {
        return E_INVALIDARG;
    };
    let gamepads = class == DI8DEVCLASS_GAMECTRL;
    let attached_only = flags & DIEDFL_ATTACHEDONLY != 0;
    let mut list: Vec<DIDEVICEINSTANCEW> = DEVICES.with_borrow(|devices| {
        devices
            .iter()
            .filter(|d| gamepads && (d.attached || !attached_only))
            .map(FakeDevice::instance_info)
            .collect()
    });
    for inst in &mut list {
        if callback(inst, ctx) == DIENUM_STOP as i32 {
            break;
        }
    }
    DI_OK
}

unsafe extern "system" fn di_create_device(
    _this: *mut IDirectInput8W,
    instance: *const GUID,
    out: *mut *mut IDirectInputDevice8W,
    _outer: *mut c_void,
) -> HRESULT {
    let instance = Guid(*instance);
    if !DEVICES.with_borrow(|d| d.iter().any(|d| d.instance == instance)) {
        return DIERR_DEVICENOTREG;
    }
    let obj = Box::new(FakeDeviceObject {
        iface: IDirectInputDevice8W {
            vtbl: &DEVICE_VTBL,
        },
        instance,
    });
    *out = Box::into_raw(obj) as *mut IDirectInputDevice8W;
    DI_OK
}

#[repr(C)]
struct FakeDeviceObject {
    iface: IDirectInputDevice8W,
    instance: Guid,
}

static DEVICE_VTBL: IDirectInputDevice8WVtbl = IDirectInputDevice8WVtbl {
    query_interface: 0,
    add_ref: 0,
    release: dev_release,
    get_capabilities: 0,
    enum_objects: dev_enum_objects,
    get_property: 0,
    set_property: dev_set_property,
    acquire: dev_acquire,
    unacquire: dev_unacquire,
    get_device_state: dev_get_device_state,
    get_device_data: 0,
    set_data_format: dev_set_data_format,
    set_event_notification: 0,
    set_cooperative_level: 0,
    get_object_info: 0,
    get_device_info: 0,
    run_control_panel: 0,
    initialize: 0,
    create_effect: 0,
    enum_effects: 0,
    get_effect_info: 0,
    get_force_feedback_state: 0,
    send_force_feedback_command: 0,
    enum_created_effect_objects: 0,
    escape: 0,
    poll: dev_poll,
    send_device_data: 0,
    enum_effects_in_file: 0,
    write_effect_to_file: 0,
    build_action_map: 0,
    set_action_map: 0,
    get_image_info: 0,
};

/// Run `f` on the scripted device behind a fake device object.
unsafe fn on_device<R>(
    this: *mut IDirectInputDevice8W,
    f: impl FnOnce(&mut FakeDevice) -> R,
) -> Option<R> {
    let instance = (*(this as *mut FakeDeviceObject)).instance;
    DEVICES.with_borrow_mut(|d| d.iter_mut().find(|d| d.instance == instance).map(f))
}

/// Status a read would return right now.
fn read_status(d: &FakeDevice) -> HRESULT {
    if !d.attached {
        DIERR_INPUTLOST
    } else if !d.acquired {
        DIERR_NOTACQUIRED
    } else {
        DI_OK
    }
}

unsafe extern "system" fn dev_release(this: *mut IDirectInputDevice8W) -> u32 {
    drop(Box::from_raw(this as *mut FakeDeviceObject));
    RELEASES.with_borrow_mut(|r| r.push("device"));
    0
}

unsafe extern "system" fn dev_enum_objects(
    this: *mut IDirectInputDevice8W,
    callback: LPDIENUMDEVICEOBJECTSCALLBACKW,
    ctx: *mut c_void,
    flags: u32,
) -> HRESULT {
    let Some(callback) = callback else {
        return E_INVALIDARG;
    };
    let Some(mut objects) = on_device(this, |d| d.object_infos(flags)) else {
        return E_FAIL;
    };
    for obj in &mut objects {
        if callback(obj, ctx) == DIENUM_STOP as i32 {
            break;
        }
    }
    DI_OK
}

unsafe extern "system" fn dev_set_property(
    this: *mut IDirectInputDevice8W,
    prop: *const GUID,
    _header: *const DIPROPHEADER,
) -> HRESULT {
    let is_range = prop as usize == DIPROP_RANGE_ID;
    on_device(this, |d| {
        if is_range {
            d.range_calls += 1;
        }
        DI_OK
    })
    .unwrap_or(E_FAIL)
}

unsafe extern "system" fn dev_acquire(this: *mut IDirectInputDevice8W) -> HRESULT {
    on_device(this, |d| {
        if d.attached {
            d.acquired = true;
            DI_OK
        } else {
            DIERR_INPUTLOST
        }
    })
    .unwrap_or(E_FAIL)
}

unsafe extern "system" fn dev_unacquire(this: *mut IDirectInputDevice8W) -> HRESULT {
    on_device(this, |d| {
        d.acquired = false;
        DI_OK
    })
    .unwrap_or(E_FAIL)
}

unsafe extern "system" fn dev_poll(this: *mut IDirectInputDevice8W) -> HRESULT {
    on_device(this, |d| read_status(d)).unwrap_or(E_FAIL)
}

unsafe extern "system" fn dev_get_device_state(
    this: *mut IDirectInputDevice8W,
    size: u32,
    data: *mut c_void,
) -> HRESULT {
    if size as usize != JOYSTATE_SIZE {
        return E_INVALIDARG;
    }
    let Some((hr, state)) = on_device(this, |d| (read_status(d), d.state)) else {
        return E_FAIL;
    };
    if hr == DI_OK {
        *(data as *mut DIJOYSTATE) = state;
    }
    hr
}

unsafe extern "system" fn dev_set_data_format(
    this: *mut IDirectInputDevice8W,
    format: *const DIDATAFORMAT,
) -> HRESULT {
    let objects = (*format).dwNumObjs;
    on_device(this, |d| {
        d.format_objects = objects;
        DI_OK
    })
    .unwrap_or(E_FAIL)
}

// ---------------------------------------------------------------------------
// Scripted devices
// ---------------------------------------------------------------------------

/// One scripted DirectInput game controller.
#[derive(Clone)]
pub struct FakeDevice {
    pub instance: Guid,
    pub product: Guid,
    pub name: String,
    pub axes: u32,
    pub buttons: u32,
    pub povs: u32,
    pub reversed: bool,
    pub attached: bool,
    pub acquired: bool,
    pub range_calls: u32,
    pub format_objects: u32,
    pub state: DIJOYSTATE,
}

impl FakeDevice {
    pub fn new(name: &str, vid: u16, pid: u16) -> Self {
        Self {
            instance: Guid::default(),
            product: product_guid(vid, pid),
            name: name.to_string(),
            axes: 2,
            buttons: 4,
            povs: 0,
            reversed: false,
            attached: true,
            acquired: false,
            range_calls: 0,
            format_objects: 0,
            state: empty_joystate(),
        }
    }

    pub fn objects(mut self, axes: u32, buttons: u32, povs: u32) -> Self {
        self.axes = axes;
        self.buttons = buttons;
        self.povs = povs;
        self
    }

    /// Enumerate objects in descending offset order.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    fn instance_info(&self) -> DIDEVICEINSTANCEW {
        // SAFETY: plain-old-data; all-zero is a valid value for every field.
        let mut info: DIDEVICEINSTANCEW = unsafe { std::mem::zeroed() };
        info.dwSize = std::mem::size_of::<DIDEVICEINSTANCEW>() as u32;
        info.guidInstance = self.instance.0;
        info.guidProduct = self.product.0;
        info.dwDevType = 0x15;
        fill_wide(&mut info.tszInstanceName, &self.name);
        fill_wide(&mut info.tszProductName, &self.name);
        info
    }

    fn object_infos(&self, flags: u32) -> Vec<DIDEVICEOBJECTINSTANCEW> {
        let object = |ofs: u32, dw_type: u32| {
            // SAFETY: plain-old-data; all-zero is a valid value for every field.
            let mut o: DIDEVICEOBJECTINSTANCEW = unsafe { std::mem::zeroed() };
            o.dwSize = std::mem::size_of::<DIDEVICEOBJECTINSTANCEW>() as u32;
            o.dwOfs = ofs;
            o.dwType = dw_type;
            o
        };

        let mut out = Vec::new();
        for i in 0..self.axes.min(8) {
            let ofs = if i < 6 { i * 4 } else { dijofs_slider(i - 6) };
            out.push(object(ofs, DIDFT_ABSAXIS | i << 8));
        }
        for i in 0..self.povs.min(4) {
            out.push(object(dijofs_pov(i), DIDFT_POV | i << 8));
        }
        for i in 0..self.buttons.min(32) {
            out.push(object(dijofs_button(i), DIDFT_PSHBUTTON | i << 8));
        }
        if self.reversed {
            out.reverse();
        }
        if flags != DIDFT_ALL {
            out.retain(|o| didft_get_type(o.dwType) & flags != 0);
        }
        out
    }
}

/// Copy `s` into a fixed UTF-16 buffer, always leaving a terminating NUL.
fn fill_wide(buf: &mut [u16], s: &str) {
    let room = buf.len().saturating_sub(1);
    for (slot, c) in buf.iter_mut().take(room).zip(s.encode_utf16()) {
        *slot = c;
    }
}

/// DirectInput product GUID for a USB device: `MAKELONG(vid, pid)` then `"PIDVID"`.
pub fn product_guid(vid: u16, pid: u16) -> Guid {
    let data1 = u128::from(u32::from(pid) << 16 | u32::from(vid));
    Guid::from_u128(data1 << 96 | u128::from(u64::from_be_bytes(*b"\0\0PIDVID")))
}

/// Attach a scripted device and return its instance GUID.
pub fn plug_device(mut device: FakeDevice) -> Guid {
    let n = NEXT_INSTANCE.get();
    NEXT_INSTANCE.set(n + 1);
    device.instance = Guid::from_u128(0x6F1D_2B60_D5A0_11CF_BFC7_4445_5354_0000 + u128::from(n));
    let instance = device.instance;
    DEVICES.with_borrow_mut(|d| d.push(device));
    instance
}

pub fn device_state(instance: Guid) -> FakeDevice {
    DEVICES
        .with_borrow(|d| d.iter().find(|d| d.instance == instance).cloned())
        .unwrap_or_else(|| panic!("no fake device {instance}"))
}

pub fn with_device(instance: Guid, f: impl FnOnce(&mut FakeDevice)) {
    DEVICES.with_borrow_mut(|d| {
        let dev = d
            .iter_mut()
            .find(|d| d.instance == instance)
            .unwrap_or_else(|| panic!("no fake device {instance}"));
        f(dev);
    });
}
