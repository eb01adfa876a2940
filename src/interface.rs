//! One-time creation of COM-style interface objects from a factory export.
//!
//! The factory follows a fixed positional convention:
//!
//! ```text
//! Factory(hinstance, version, &iid, &mut out, outer) -> HRESULT
//! ```
//!
//! `out` is zeroed before the call and trusted only on success. The resulting
//! pointer is wrapped in a [`ComPtr`] and released exactly once when its owner
//! (the backend) is dropped.
//!
//! ## Status check
//! A failing HRESULT is always fatal. After a successful HRESULT the thread's
//! last-error value is inspected too: `ERROR_SUCCESS` passes, and so does
//! `ERROR_INSUFFICIENT_BUFFER`, which `DirectInput8Create` is known to leave
//! behind on working systems. Any other last-error value is reported as
//! [`InitError::FactoryLastError`]. The tolerance applies to that one code only.

use std::ffi::{c_void, CStr};
use std::ptr;

use windows_sys::core::{GUID, HRESULT};
use windows_sys::Win32::Devices::HumanInterfaceDevice::DIRECTINPUT_VERSION;
use windows_sys::Win32::Foundation::{ERROR_INSUFFICIENT_BUFFER, ERROR_SUCCESS};

use crate::com::{ComInterface, ComPtr, IDirectInput8W};
use crate::error::InitError;
use crate::guid::IID_IDIRECTINPUT8W;
use crate::library::{typed_symbol, NativeLibrary};
use crate::platform::Platform;

pub type FactoryFn = unsafe extern "system" fn(
    hinstance: *mut c_void,
    version: u32,
    iid: *const GUID,
    out: *mut *mut c_void,
    outer: *mut c_void,
) -> HRESULT;

/// Everything needed to call one factory export.
#[derive(Clone, Copy)]
pub struct FactoryCall {
    pub entry_point: &'static str,
    pub symbol: &'static CStr,
    pub version: u32,
    pub iid: &'static GUID,
}

impl std::fmt::Debug for FactoryCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryCall")
            .field("entry_point", &self.entry_point)
            .field("symbol", &self.symbol)
            .field("version", &self.version)
            .field("iid", &crate::guid::Guid(*self.iid))
            .finish()
    }
}

pub const DIRECTINPUT8_CREATE: FactoryCall = FactoryCall {
    entry_point: "DirectInput8Create",
    symbol: c"DirectInput8Create",
    version: DIRECTINPUT_VERSION,
    iid: &IID_IDIRECTINPUT8W,
};

/// Outcome of a factory call as seen by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactoryStatus {
    pub hresult: HRESULT,
    pub last_error: u32,
}

/// Classify a factory outcome.
pub fn check_factory_status(call: &FactoryCall, status: FactoryStatus) -> Result<(), InitError> {
    if status.hresult != 0 {
        return Err(InitError::FactoryFailed {
            entry_point: call.entry_point,
            hresult: status.hresult,
        });
    }
    match status.last_error {
        ERROR_SUCCESS => Ok(()),
        ERROR_INSUFFICIENT_BUFFER => {
            log::debug!(
                "{} left ERROR_INSUFFICIENT_BUFFER after success; ignoring",
                call.entry_point
            );
            Ok(())
        }
        code => Err(InitError::FactoryLastError {
            entry_point: call.entry_point,
            code,
        }),
    }
}

/// Resolve `call.symbol` in `library`, invoke it, and take ownership of the result.
pub fn create_interface<P, I>(
    platform: &P,
    library: &P::Library,
    call: &FactoryCall,
) -> Result<ComPtr<I>, InitError>
where
    P: Platform,
    I: ComInterface,
{
    // SAFETY: `FactoryFn` is the documented signature of every export we call here.
    let factory: FactoryFn = unsafe { typed_symbol(library, call.symbol) }.ok_or_else(|| {
        InitError::MissingEntryPoint {
            library: library.name().to_string(),
            symbol: call.entry_point.to_string(),
        }
    })?;

    let module = platform.current_module().ok_or(InitError::ModuleHandle)?;

    let mut out: *mut c_void = ptr::null_mut();
    platform.clear_last_error();
    // SAFETY: arguments follow the factory's positional contract; `out` is a
    // valid, zeroed slot that lives across the call.
    let hresult = unsafe {
        factory(
            module.as_raw(),
            call.version,
            call.iid,
            &mut out,
            ptr::null_mut(),
        )
    };
    let status = FactoryStatus {
        hresult,
        last_error: platform.last_error(),
    };

    if let Err(e) = check_factory_status(call, status) {
        if !out.is_null() {
            // SAFETY: the factory handed us a reference even though we reject the call.
            if let Some(p) = unsafe { ComPtr::<I>::from_raw(out as *mut I) } {
                drop(p);
            }
        }
        return Err(e);
    }

    // SAFETY: success means `out` carries one reference to an `I`.
    unsafe { ComPtr::from_raw(out as *mut I) }.ok_or(InitError::NullInterface {
        entry_point: call.entry_point,
    })
}

/// Create the process-wide `IDirectInput8W` object.
pub fn create_direct_input<P: Platform>(
    platform: &P,
    library: &P::Library,
) -> Result<ComPtr<IDirectInput8W>, InitError> {
    create_interface(platform, library, &DIRECTINPUT8_CREATE)
}
