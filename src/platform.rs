//! Process-level hooks the backends need from the host OS.
//!
//! [`Platform`] extends [`LibraryLoader`] with the few process queries the
//! interface initializer relies on. Windows builds use
//! [`Win32Platform`](crate::backends::windows::Win32Platform); everywhere else
//! [`NullPlatform`] reports every library as missing, so all backends come up
//! unavailable and every device reads as absent.

use std::collections::HashSet;
use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use crate::library::{LibraryLoader, NativeLibrary};

/// Non-null module handle (`HINSTANCE`) of the running process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleHandle(NonNull<c_void>);

impl ModuleHandle {
    pub fn new(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    #[inline]
    pub fn as_raw(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Product ids (`MAKELONG(vid, pid)`) of controllers already served by XInput.
pub type XInputProducts = fn() -> HashSet<u32>;

pub fn no_xinput_products() -> HashSet<u32> {
    HashSet::new()
}

pub trait Platform: LibraryLoader {
    /// Module handle of the current process, or `None` if the OS refuses.
    fn current_module(&self) -> Option<ModuleHandle>;

    /// Reset the calling thread's last-error value.
    fn clear_last_error(&self) {}

    /// The calling thread's last-error value.
    fn last_error(&self) -> u32 {
        0
    }

    /// Source of XInput-served product ids, used to keep DirectInput from
    /// reporting the same controller twice.
    fn xinput_products(&self) -> XInputProducts {
        no_xinput_products
    }
}

/// A platform with no native input libraries.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPlatform;

/// Uninhabited: [`NullPlatform`] never loads anything.
#[derive(Debug)]
pub enum NullLibrary {}

impl NativeLibrary for NullLibrary {
    fn name(&self) -> &str {
        match *self {}
    }

    fn symbol(&self, _name: &CStr) -> Option<NonNull<c_void>> {
        match *self {}
    }
}

impl LibraryLoader for NullPlatform {
    type Library = NullLibrary;

    fn load(&self, _name: &str) -> Option<NullLibrary> {
        None
    }
}

impl Platform for NullPlatform {
    fn current_module(&self) -> Option<ModuleHandle> {
        None
    }
}

#[cfg(target_os = "windows")]
pub type SystemPlatform = crate::backends::windows::Win32Platform;

#[cfg(not(target_os = "windows"))]
pub type SystemPlatform = NullPlatform;
