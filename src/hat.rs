//! Hat (POV / D-pad) positions.
//!
//! A hat reports one of 9 positions. The integer encoding is a direction
//! bitmask, the same one SDL and the higher-level gamepad layer use:
//!
//! | position   | bits |
//! |------------|------|
//! | centered   | 0    |
//! | up         | 1    |
//! | right      | 2    |
//! | down       | 4    |
//! | left       | 8    |
//!
//! Diagonals are the union of their two neighbours (`RightUp = 3`, ...).

use serde::{Deserialize, Serialize};

#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HatState {
    #[default]
    Centered = 0,
    Up = 1,
    RightUp = 3,
    Right = 2,
    RightDown = 6,
    Down = 4,
    LeftDown = 12,
    Left = 8,
    LeftUp = 9,
}

/// Clockwise from up; index `i` covers `i * 45` degrees.
const CLOCKWISE: [HatState; 8] = [
    HatState::Up,
    HatState::RightUp,
    HatState::Right,
    HatState::RightDown,
    HatState::Down,
    HatState::LeftDown,
    HatState::Left,
    HatState::LeftUp,
];

/// DirectInput POV units per degree.
const DI_DEGREES: u32 = 100;

impl HatState {
    /// Raw bitmask value.
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Inverse of [`bits`](Self::bits). Returns `None` for impossible masks
    /// (e.g. up + down).
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Centered),
            1 => Some(Self::Up),
            3 => Some(Self::RightUp),
            2 => Some(Self::Right),
            6 => Some(Self::RightDown),
            4 => Some(Self::Down),
            12 => Some(Self::LeftDown),
            8 => Some(Self::Left),
            9 => Some(Self::LeftUp),
            _ => None,
        }
    }

    /// Decode a DirectInput POV value (hundredths of a degree, clockwise from north).
    ///
    /// A low word of `0xFFFF` means centered. Each 45° sector starting at a
    /// compass point maps to that point.
    pub fn from_pov(pov: u32) -> Self {
        if pov & 0xFFFF == 0xFFFF {
            return Self::Centered;
        }
        let sector = (pov & 0xFFFF) / (45 * DI_DEGREES);
        CLOCKWISE
            .get(sector as usize)
            .copied()
            .unwrap_or(Self::Centered)
    }

    /// Build a hat from four D-pad switches.
    ///
    /// Conflicting pairs (up + down, left + right) read as centered.
    pub fn from_dpad(up: bool, down: bool, left: bool, right: bool) -> Self {
        match (up, down, left, right) {
            (true, false, false, false) => Self::Up,
            (true, false, false, true) => Self::RightUp,
            (false, false, false, true) => Self::Right,
            (false, true, false, true) => Self::RightDown,
            (false, true, false, false) => Self::Down,
            (false, true, true, false) => Self::LeftDown,
            (false, false, true, false) => Self::Left,
            (true, false, true, false) => Self::LeftUp,
            _ => Self::Centered,
        }
    }
}
