//! Immutable per-device input snapshot.
//!
//! A backend read produces a complete [`GamepadState`]; the poller swaps it in
//! whole, so accessors never observe a half-updated device.
//!
//! ## Value conventions
//! - **Axes:** `f64` in `[-1.0, 1.0]`. Construction clamps, and NaN reads as `0.0`.
//! - **Buttons:** `true` while held.
//! - **Hats:** [`HatState`] (centered + 8 directions).

use serde::Serialize;

use crate::hat::HatState;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GamepadState {
    axes: Vec<f64>,
    buttons: Vec<bool>,
    hats: Vec<HatState>,
}

impl GamepadState {
    /// No axes, no buttons, no hats.
    pub const EMPTY: GamepadState = GamepadState {
        axes: Vec::new(),
        buttons: Vec::new(),
        hats: Vec::new(),
    };

    /// Build a snapshot, clamping every axis into `[-1.0, 1.0]` (NaN becomes `0.0`).
    pub fn new(axes: Vec<f64>, buttons: Vec<bool>, hats: Vec<HatState>) -> Self {
        let axes = axes.into_iter().map(clamp_axis).collect();
        Self {
            axes,
            buttons,
            hats,
        }
    }

    #[inline]
    pub fn axes(&self) -> &[f64] {
        &self.axes
    }

    #[inline]
    pub fn buttons(&self) -> &[bool] {
        &self.buttons
    }

    #[inline]
    pub fn hats(&self) -> &[HatState] {
        &self.hats
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() && self.buttons.is_empty() && self.hats.is_empty()
    }
}

#[inline]
fn clamp_axis(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-1.0, 1.0)
    }
}

/// Map a signed 16-bit stick value onto `[-1, 1]` asymmetrically, so both
/// extremes reach exactly ±1.
#[inline]
pub fn normalize_thumb(v: i16) -> f64 {
    if v >= 0 {
        f64::from(v) / 32767.0
    } else {
        f64::from(v) / 32768.0
    }
}

/// Map an 8-bit trigger onto `[-1, 1]`: released `-1.0`, fully pressed `+1.0`.
#[inline]
pub fn normalize_trigger(v: u8) -> f64 {
    f64::from(v) / 255.0 * 2.0 - 1.0
}

/// Map a DirectInput axis in the `[-32768, 32767]` range onto `[-1, 1]`.
#[inline]
pub fn normalize_ranged(v: i32) -> f64 {
    clamp_axis((f64::from(v) + 0.5) / 32767.5)
}
