#![cfg(target_os = "windows")]

//! Win32 implementation of [`Platform`].
//!
//! Libraries are loaded with `LoadLibraryW` and freed with `FreeLibrary` when
//! the owning [`Win32Library`] drops. Entry points come from `GetProcAddress`.
//! The module handle handed to COM factories is the process image
//! (`GetModuleHandleW(NULL)`).

pub mod xinput_compat;

use std::ffi::{c_void, CStr, OsStr};
use std::os::windows::ffi::OsStrExt;
use std::ptr::{self, NonNull};

use windows_sys::Win32::Foundation::{FreeLibrary, GetLastError, SetLastError};
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress, LoadLibraryW};

use crate::library::{LibraryLoader, NativeLibrary};
use crate::platform::{ModuleHandle, Platform, XInputProducts};

/// UTF-16 + NUL.
fn wide_null(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

/// An owned `HMODULE`.
#[derive(Debug)]
pub struct Win32Library {
    name: String,
    handle: NonNull<c_void>,
}

impl NativeLibrary for Win32Library {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: `handle` is a live module; `name` is NUL-terminated.
        let proc = unsafe { GetProcAddress(self.handle.as_ptr(), name.as_ptr() as *const u8) }?;
        NonNull::new(proc as *mut c_void)
    }
}

impl Drop for Win32Library {
    fn drop(&mut self) {
        // SAFETY: we own the reference taken by `LoadLibraryW`.
        unsafe {
            FreeLibrary(self.handle.as_ptr());
        }
        log::debug!("freed {}", self.name);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Win32Platform;

impl LibraryLoader for Win32Platform {
    type Library = Win32Library;

    fn load(&self, name: &str) -> Option<Win32Library> {
        let wide = wide_null(name);
        // SAFETY: `wide` is NUL-terminated; failure just yields a null handle.
        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
        NonNull::new(handle).map(|handle| Win32Library {
            name: name.to_string(),
            handle,
        })
    }
}

impl Platform for Win32Platform {
    fn current_module(&self) -> Option<ModuleHandle> {
        // SAFETY: a null name asks for the calling process's image.
        ModuleHandle::new(unsafe { GetModuleHandleW(ptr::null()) })
    }

    fn clear_last_error(&self) {
        unsafe { SetLastError(0) }
    }

    fn last_error(&self) -> u32 {
        unsafe { GetLastError() }
    }

    fn xinput_products(&self) -> XInputProducts {
        xinput_compat::xinput_products
    }
}
