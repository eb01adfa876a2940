//! Backend implementations of [`Backend`](crate::device::Backend).
//!
//! - [`xinput`]: the four XInput user slots.
//! - [`dinput`]: DirectInput 8 game controllers through COM vtables.
//! - [`virtual_input`]: scripted in-memory pads.
//! - `windows`: the Win32 [`Platform`](crate::platform::Platform) (Windows only).
//!
//! The native backends are written against the `Platform`/`NativeLibrary`
//! seams, so they compile everywhere. Only `windows` touches the OS.

pub mod dinput;
pub mod virtual_input;
pub mod xinput;

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
pub mod windows;

pub use dinput::{DirectInputBackend, DirectInputOptions};
pub use virtual_input::{VirtualBackend, VirtualHandle};
pub use xinput::XInputBackend;
