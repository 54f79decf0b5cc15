//! Device selection state

use std::collections::HashSet;

use iotsim_client::Device;

/// Loaded devices of the active person and the ids currently selected.
///
/// Selected ids are always a subset of the loaded device ids once
/// [`SelectionStore::prune`] has run; the facade prunes after every reload.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    devices: Vec<Device>,
    selected: HashSet<String>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the device list. The selection is left as is.
    pub fn set_devices(&mut self, devices: Vec<Device>) {
        self.devices = devices;
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn select_all(&mut self) {
        self.selected = self.devices.iter().map(|d| d.id.clone()).collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Replace the selection with `ids`, keeping only ids of loaded devices
    pub fn select_only<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = ids.into_iter().map(Into::into).collect();
        self.prune();
    }

    /// Flip membership of `id`.
    ///
    /// Returns `false` (and changes nothing) when `id` is not a loaded device.
    pub fn toggle(&mut self, id: &str) -> bool {
        if !self.contains_device(id) {
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
        true
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in device-list order
    pub fn selected_ids(&self) -> Vec<String> {
        self.devices
            .iter()
            .filter(|d| self.selected.contains(&d.id))
            .map(|d| d.id.clone())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// The selected device when exactly one is selected
    pub fn single_selected_device(&self) -> Option<&Device> {
        if self.selected.len() != 1 {
            return None;
        }
        self.devices.iter().find(|d| self.selected.contains(&d.id))
    }

    /// Drop selected ids that are not in the device list
    pub fn prune(&mut self) {
        let devices = &self.devices;
        self.selected
            .retain(|id| devices.iter().any(|d| &d.id == id));
    }

    /// Empty both the device list and the selection
    pub fn clear(&mut self) {
        self.devices.clear();
        self.selected.clear();
    }

    fn contains_device(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id)
    }
}

#[cfg(test)]
pub(crate) fn device(id: &str) -> Device {
    Device {
        id: id.to_string(),
        name: format!("Device {}", id),
        external_device_id: id.to_uppercase(),
        credential_key: format!("key-{}", id),
        device_type: None,
        description: None,
        owner_person_id: None,
        location: None,
    }
}
