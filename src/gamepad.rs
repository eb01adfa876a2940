//! Per-device polling contract.
//!
//! A [`NativeGamepad`] holds a presence flag and the last [`GamepadState`]
//! read from its backend. Counts and values are stable between refreshes.
//!
//! Out-of-range indices are not errors: `axis_value` returns `0.0`,
//! `is_button_pressed` returns `false`, and `hat_state` returns
//! [`HatState::Centered`]. Callers that care should bound-check against the
//! counts first.

use crate::error::ReadError;
use crate::hat::HatState;
use crate::state::GamepadState;

#[derive(Clone, Debug, PartialEq)]
pub struct NativeGamepad {
    connected: bool,
    state: GamepadState,
}

/// What every unknown or removed id resolves to.
pub(crate) static ABSENT: NativeGamepad = NativeGamepad {
    connected: false,
    state: GamepadState::EMPTY,
};

impl NativeGamepad {
    /// A freshly registered device: present, with no channels until the first refresh.
    pub fn new() -> Self {
        Self {
            connected: true,
            state: GamepadState::EMPTY,
        }
    }

    /// Apply the outcome of one backend read.
    ///
    /// Success swaps in the new snapshot; failure marks the device disconnected
    /// and drops its channels.
    pub(crate) fn apply(&mut self, read: Result<GamepadState, ReadError>) {
        match read {
            Ok(state) => {
                self.connected = true;
                self.state = state;
            }
            Err(e) => {
                if self.connected {
                    log::debug!("gamepad read failed, marking disconnected: {e}");
                }
                self.connected = false;
                self.state = GamepadState::EMPTY;
            }
        }
    }

    /// Whether the last read succeeded.
    pub fn present(&self) -> bool {
        self.connected
    }

    /// Number of axes in the last snapshot. Zero while absent.
    pub fn axis_num(&self) -> usize {
        self.state.axes().len()
    }

    /// Number of buttons in the last snapshot.
    pub fn button_num(&self) -> usize {
        self.state.buttons().len()
    }

    /// Number of hats in the last snapshot.
    pub fn hat_num(&self) -> usize {
        self.state.hats().len()
    }

    /// Axis value in `[-1.0, 1.0]`, or `0.0` when `axis` is out of range.
    pub fn axis_value(&self, axis: usize) -> f64 {
        self.state.axes().get(axis).copied().unwrap_or(0.0)
    }

    /// `false` for out-of-range buttons.
    pub fn is_button_pressed(&self, button: usize) -> bool {
        self.state.buttons().get(button).copied().unwrap_or(false)
    }

    /// [`HatState::Centered`] for out-of-range hats.
    pub fn hat_state(&self, hat: usize) -> HatState {
        self.state.hats().get(hat).copied().unwrap_or_default()
    }

    /// The whole last-read snapshot.
    pub fn state(&self) -> &GamepadState {
        &self.state
    }
}

impl Default for NativeGamepad {
    fn default() -> Self {
        Self::new()
    }
}
