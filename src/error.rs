//! Error types.
//!
//! Three concerns, three enums:
//! - [`InitError`]: a *loaded* native library misbehaved during initialization.
//! - [`ReadError`]: a per-device read failed. Never surfaced past `update()`.
//! - [`ConfigError`]: the backend configuration could not be loaded.
//!
//! A library that is simply missing is not an error at all; it shows up as
//! [`Availability::Unavailable`](crate::library::Availability::Unavailable).

use thiserror::Error;

/// Fatal initialization failure of one backend.
///
/// Returned once from [`NativeGamepads::init`](crate::manager::NativeGamepads::init).
/// The failing backend stays unavailable afterwards; other backends are unaffected.
#[derive(Debug, Error)]
pub enum InitError {
    /// The current process's module handle could not be queried.
    #[error("GetModuleHandleW returned no handle for the current process")]
    ModuleHandle,

    /// A library loaded but does not export a required entry point.
    #[error("{library} does not export {symbol}")]
    MissingEntryPoint { library: String, symbol: String },

    /// The factory entry point returned a failing HRESULT.
    #[error("{entry_point} failed with HRESULT 0x{hresult:08x}")]
    FactoryFailed {
        entry_point: &'static str,
        hresult: i32,
    },

    /// The factory returned success but left a last-error value that is not tolerated.
    #[error("{entry_point} left last error {code}")]
    FactoryLastError {
        entry_point: &'static str,
        code: u32,
    },

    /// The factory reported success without filling the output slot.
    #[error("{entry_point} succeeded but returned a null interface")]
    NullInterface { entry_point: &'static str },
}

/// Per-device read failure.
///
/// Backends return this from [`Backend::read`](crate::device::Backend::read); the
/// registry turns it into `present() == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The device is gone (unplugged, slot empty, handle closed).
    #[error("device disconnected")]
    Disconnected,

    /// The native call failed with a status code.
    #[error("native call failed with status 0x{0:08x}")]
    Status(i32),
}

/// Configuration loading/validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An enabled library family has no candidate names to try.
    #[error("library family `{0}` is enabled but lists no candidate libraries")]
    EmptyCandidates(&'static str),
}
