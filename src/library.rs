//! Optional native library resolution.
//!
//! Each backend belongs to a [`LibraryFamily`]: an ordered list of candidate
//! library names. [`resolve`] tries them newest-first and keeps the first one
//! that loads. A family with no loadable candidate is
//! [`Availability::Unavailable`], which is a normal outcome rather than an error.
//!
//! Library handles are owned values: dropping a [`NativeLibrary`] frees it.

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use crate::config::FamilyConfig;

/// Default candidates for the DirectInput 8 family.
pub const DIRECTINPUT8_LIBRARIES: &[&str] = &["dinput8.dll"];

/// Default candidates for the XInput family, newest first.
pub const XINPUT_LIBRARIES: &[&str] = &[
    "xinput1_4.dll",
    "xinput1_3.dll",
    "xinput9_1_0.dll",
    "xinput1_2.dll",
    "xinput1_1.dll",
];

/// A loaded dynamic library.
pub trait NativeLibrary {
    /// Name the library was loaded under.
    fn name(&self) -> &str;

    /// Address of an exported symbol, if present.
    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>>;
}

/// Loads libraries by name. `None` means "not installed / not loadable".
pub trait LibraryLoader {
    type Library: NativeLibrary + 'static;

    fn load(&self, name: &str) -> Option<Self::Library>;
}

/// Optional backend resource: either absent or present, never a null handle.
#[derive(Debug)]
pub enum Availability<T> {
    Unavailable,
    Available(T),
}

impl<T> Availability<T> {
    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    /// Borrow the value in place.
    pub fn as_mut(&mut self) -> Availability<&mut T> {
        match self {
            Availability::Unavailable => Availability::Unavailable,
            Availability::Available(v) => Availability::Available(v),
        }
    }

    /// Convert into an `Option`, dropping the distinction.
    pub fn available(self) -> Option<T> {
        match self {
            Availability::Unavailable => None,
            Availability::Available(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for Availability<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Availability::Available(v),
            None => Availability::Unavailable,
        }
    }
}

/// One logical native API family and its ordered candidate list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryFamily {
    pub name: &'static str,
    pub candidates: Vec<String>,
}

impl LibraryFamily {
    /// Family `name` trying `candidates` in order.
    pub fn new(name: &'static str, candidates: &[&str]) -> Self {
        Self {
            name,
            candidates: candidates.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub(crate) fn from_config(name: &'static str, cfg: &FamilyConfig) -> Self {
        Self {
            name,
            candidates: cfg.libraries.clone(),
        }
    }
}

/// Try each candidate of `family` in order; stop at the first that loads.
pub fn resolve<L: LibraryLoader>(loader: &L, family: &LibraryFamily) -> Availability<L::Library> {
    let loaded = family.candidates.iter().find_map(|candidate| {
        let lib = loader.load(candidate);
        match &lib {
            Some(_) => log::info!("[{}] loaded {}", family.name, candidate),
            None => log::debug!("[{}] {} not loadable", family.name, candidate),
        }
        lib
    });
    if loaded.is_none() {
        log::info!("[{}] no candidate library available", family.name);
    }
    loaded.into()
}

/// Look up `symbol` and reinterpret it as the function pointer type `F`.
///
/// # Safety
/// `F` must be an `extern "system"` function pointer type matching the real
/// signature of the export.
pub(crate) unsafe fn typed_symbol<F: Copy>(lib: &impl NativeLibrary, symbol: &CStr) -> Option<F> {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());
    let ptr = lib.symbol(symbol)?;
    Some(std::mem::transmute_copy::<*mut c_void, F>(&ptr.as_ptr()))
}
