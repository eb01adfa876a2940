//! Registry of connected devices across all backends.
//!
//! Each entry ties a registry [`DeviceId`] to `(backend slot, DeviceKey)` and
//! owns the device's [`NativeGamepad`]. Ids are handed out monotonically and
//! never reused, so a stale id can only ever resolve to the absent gamepad.

use std::collections::{BTreeMap, HashSet};

use crate::device::{DeviceId, DeviceKey};
use crate::gamepad::{NativeGamepad, ABSENT};
use crate::metadata::DeviceMeta;

#[derive(Debug)]
pub(crate) struct Entry {
    pub backend: usize,
    pub key: DeviceKey,
    pub meta: DeviceMeta,
    pub pad: NativeGamepad,
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: BTreeMap<DeviceId, Entry>,
    next_id: u32,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered devices, present or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.entries.keys().copied()
    }

    /// Whether `id` is still registered. Ids are never reused.
    pub fn contains(&self, id: DeviceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Id already assigned to `key` on backend slot `backend`, if any.
    pub fn find(&self, backend: usize, key: &DeviceKey) -> Option<DeviceId> {
        self.entries
            .iter()
            .find(|(_, e)| e.backend == backend && e.key == *key)
            .map(|(id, _)| *id)
    }

    /// Register a device. An already registered `(backend, key)` keeps its id.
    pub fn insert(&mut self, backend: usize, key: DeviceKey, meta: DeviceMeta) -> DeviceId {
        if let Some(id) = self.find(backend, &key) {
            return id;
        }
        let id = DeviceId(self.next_id);
        self.next_id += 1;
        let label = meta.label();
        log::info!("[{}] connected {key} as {id} ({label})", meta.backend);
        self.entries.insert(
            id,
            Entry {
                backend,
                key,
                meta,
                pad: NativeGamepad::new(),
            },
        );
        id
    }

    /// Unregister `id`, returning its backend slot and key for cleanup.
    pub fn remove(&mut self, id: DeviceId) -> Option<(usize, DeviceKey)> {
        let Entry {
            backend,
            key,
            meta,
            ..
        } = self.entries.remove(&id)?;
        log::info!("[{}] disconnected {id} ({key})", meta.backend);
        Some((backend, key))
    }

    /// Make `backend`'s registered set equal to `found`.
    ///
    /// Devices still attached keep their ids; new ones are appended; vanished
    /// ones are removed. Returns the keys that were removed.
    pub fn replace_backend(
        &mut self,
        backend: usize,
        found: Vec<(DeviceKey, DeviceMeta)>,
    ) -> Vec<DeviceKey> {
        let keep: HashSet<DeviceKey> = found.iter().map(|(k, _)| *k).collect();
        let stale: Vec<DeviceId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.backend == backend && !keep.contains(&e.key))
            .map(|(id, _)| *id)
            .collect();

        let mut removed = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some((_, key)) = self.remove(id) {
                removed.push(key);
            }
        }
        for (key, meta) in found {
            self.insert(backend, key, meta);
        }
        removed
    }

    /// Drop everything, returning `(backend, key)` pairs for cleanup.
    pub fn clear(&mut self) -> Vec<(usize, DeviceKey)> {
        std::mem::take(&mut self.entries)
            .into_values()
            .map(|e| (e.backend, e.key))
            .collect()
    }

    /// Gamepad for `id`; unknown ids resolve to a shared absent gamepad.
    pub fn gamepad(&self, id: DeviceId) -> &NativeGamepad {
        self.entries.get(&id).map(|e| &e.pad).unwrap_or(&ABSENT)
    }

    /// Metadata recorded at registration.
    pub fn meta(&self, id: DeviceId) -> Option<&DeviceMeta> {
        self.entries.get(&id).map(|e| &e.meta)
    }

    pub(crate) fn entry_mut(&mut self, id: DeviceId) -> Option<&mut Entry> {
        self.entries.get_mut(&id)
    }
}
