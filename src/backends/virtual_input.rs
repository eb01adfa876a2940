use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::device::{Backend, BackendKind, DeviceKey};
use crate::error::ReadError;
use crate::hat::HatState;
use crate::metadata::DeviceMeta;
use crate::state::GamepadState;

#[derive(Clone, Debug)]
struct VirtualPad {
    name: String,
    plugged: bool,
    axes: Vec<f64>,
    buttons: Vec<bool>,
    hats: Vec<HatState>,
}

type Pads = Rc<RefCell<BTreeMap<u32, VirtualPad>>>;

/// In-memory backend whose controllers are scripted through a [`VirtualHandle`].
///
/// Counts are arbitrary per pad, which makes it the easiest way to drive
/// hot-plug and layout edge cases without hardware.
#[derive(Default)]
pub struct VirtualBackend {
    pads: Pads,
}

/// Script side of a [`VirtualBackend`]. Cheap to clone; all clones share the pads.
#[derive(Clone, Default)]
pub struct VirtualHandle {
    pads: Pads,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scripting handle sharing this backend's pads. Stays usable after the
    /// backend is handed to a manager.
    pub fn handle(&self) -> VirtualHandle {
        VirtualHandle {
            pads: Rc::clone(&self.pads),
        }
    }
}

impl VirtualHandle {
    /// Plug a pad into `slot` with the given channel counts, all neutral.
    ///
    /// Re-plugging an existing slot resets it.
    pub fn plug(&self, slot: u32, name: &str, axes: usize, buttons: usize, hats: usize) {
        self.pads.borrow_mut().insert(
            slot,
            VirtualPad {
                name: name.to_string(),
                plugged: true,
                axes: vec![0.0; axes],
                buttons: vec![false; buttons],
                hats: vec![HatState::Centered; hats],
            },
        );
    }

    /// Pull the pad out. Reads fail until it is plugged again.
    pub fn unplug(&self, slot: u32) {
        if let Some(pad) = self.pads.borrow_mut().get_mut(&slot) {
            pad.plugged = false;
        }
    }

    /// Out-of-range slots and channels are ignored, here and below.
    pub fn set_axis(&self, slot: u32, axis: usize, value: f64) {
        self.edit(slot, |p| {
            if let Some(a) = p.axes.get_mut(axis) {
                *a = value;
            }
        });
    }

    pub fn press(&self, slot: u32, button: usize, pressed: bool) {
        self.edit(slot, |p| {
            if let Some(b) = p.buttons.get_mut(button) {
                *b = pressed;
            }
        });
    }

    pub fn set_hat(&self, slot: u32, hat: usize, state: HatState) {
        self.edit(slot, |p| {
            if let Some(h) = p.hats.get_mut(hat) {
                *h = state;
            }
        });
    }

    fn edit(&self, slot: u32, f: impl FnOnce(&mut VirtualPad)) {
        if let Some(pad) = self.pads.borrow_mut().get_mut(&slot) {
            f(pad);
        }
    }
}

impl Backend for VirtualBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Virtual
    }

    fn scan(&mut self) -> Result<Vec<(DeviceKey, DeviceMeta)>, ReadError> {
        Ok(self
            .pads
            .borrow()
            .iter()
            .filter(|(_, p)| p.plugged)
            .map(|(&slot, p)| {
                (
                    DeviceKey::Slot(slot),
                    DeviceMeta::for_slot("virtual", slot, p.name.clone()),
                )
            })
            .collect())
    }

    fn read(&mut self, key: &DeviceKey) -> Result<GamepadState, ReadError> {
        let DeviceKey::Slot(slot) = key else {
            return Err(ReadError::Disconnected);
        };
        match self.pads.borrow().get(slot) {
            Some(p) if p.plugged => Ok(GamepadState::new(
                p.axes.clone(),
                p.buttons.clone(),
                p.hats.clone(),
            )),
            _ => Err(ReadError::Disconnected),
        }
    }

    fn close(&mut self, key: &DeviceKey) {
        if let DeviceKey::Slot(slot) = key {
            let mut pads = self.pads.borrow_mut();
            if pads.get(slot).is_some_and(|p| !p.plugged) {
                pads.remove(slot);
            }
        }
    }
}
