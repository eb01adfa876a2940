//! Identity wrapper around the native `GUID`.
//!
//! `windows_sys::core::GUID` is plain data with no comparison or hashing, so
//! device instances are keyed by [`Guid`], which adds those on top of the same
//! 16-byte layout.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use windows_sys::core::GUID;

/// `IID_IDirectInput8W`. Not exported by `windows-sys`.
pub const IID_IDIRECTINPUT8W: GUID = GUID::from_u128(0xbf798031_483a_4da2_aa99_5d64ed369700);

/// A native `GUID` with value semantics.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct Guid(pub GUID);

impl Guid {
    pub const fn from_u128(value: u128) -> Self {
        Self(GUID::from_u128(value))
    }

    /// Big-endian packing of all four fields, the inverse of `from_u128`.
    pub fn to_u128(&self) -> u128 {
        let g = &self.0;
        (u128::from(g.data1) << 96)
            | (u128::from(g.data2) << 80)
            | (u128::from(g.data3) << 64)
            | u128::from(u64::from_be_bytes(g.data4))
    }

    #[inline]
    pub fn as_raw(&self) -> &GUID {
        &self.0
    }

    /// USB vendor id carried in a DirectInput product GUID (`MAKELONG(vid, pid)`).
    #[inline]
    pub fn product_vid(&self) -> u16 {
        (self.0.data1 & 0xFFFF) as u16
    }

    /// USB product id carried in a DirectInput product GUID.
    #[inline]
    pub fn product_pid(&self) -> u16 {
        (self.0.data1 >> 16) as u16
    }
}

impl From<GUID> for Guid {
    fn from(raw: GUID) -> Self {
        Self(raw)
    }
}

impl PartialEq for Guid {
    fn eq(&self, other: &Self) -> bool {
        self.to_u128() == other.to_u128()
    }
}

impl Eq for Guid {}

impl Hash for Guid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u128().hash(state);
    }
}

impl PartialOrd for Guid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Guid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_u128().cmp(&other.to_u128())
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::from_u128(0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.0;
        let d = &g.data4;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            g.data1, g.data2, g.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
