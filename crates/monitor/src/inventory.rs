//! Known-device inventory and new-device detection.

use crate::model::{DeviceRecord, SecurityEvent, Severity};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Authoritative client-side record of previously observed devices, keyed
/// by MAC address. Written by both the discovery loop and the realtime
/// channel, so the map itself is concurrent.
#[derive(Debug, Default)]
pub struct DeviceInventory {
    known: DashMap<String, DeviceRecord>,
}

impl DeviceInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile a scan result against the known set.
    ///
    /// Devices whose MAC has never been seen are inserted and produce one
    /// info-severity event each; already-known devices are refreshed in
    /// place without an event. Devices absent from this scan are kept
    /// untouched; going offline is deliberately not detected here.
    pub fn reconcile(&self, scan: &[DeviceRecord]) -> Vec<SecurityEvent> {
        let mut detected = Vec::new();
        for device in scan {
            match self.known.entry(device.mac.clone()) {
                Entry::Occupied(mut existing) => {
                    existing.insert(device.clone());
                }
                Entry::Vacant(slot) => {
                    slot.insert(device.clone());
                    detected.push(SecurityEvent::new(
                        Severity::Info,
                        format!("New device detected: {} ({})", device.name, device.ip),
                    ));
                }
            }
        }
        detected
    }

    /// Refresh a single known device from a realtime update. Unknown
    /// devices are ignored; they will be picked up by the next full scan.
    pub fn refresh(&self, device: &DeviceRecord) {
        if let Some(mut existing) = self.known.get_mut(&device.mac) {
            existing.status = device.status;
            existing.last_seen = device.last_seen;
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn contains(&self, mac: &str) -> bool {
        self.known.contains_key(mac)
    }

    /// Copy of the inventory, ordered by IP for stable display.
    pub fn snapshot(&self) -> Vec<DeviceRecord> {
        let mut devices: Vec<DeviceRecord> =
            self.known.iter().map(|entry| entry.value().clone()).collect();
        devices.sort_by(|a, b| a.ip.cmp(&b.ip));
        devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeviceCategory, DeviceStatus};
    use chrono::Utc;

    fn device(mac: &str, ip: &str, name: &str) -> DeviceRecord {
        DeviceRecord {
            mac: mac.to_string(),
            ip: ip.to_string(),
            name: name.to_string(),
            category: DeviceCategory::Computer,
            status: DeviceStatus::Online,
            last_seen: Utc::now(),
            manufacturer: None,
        }
    }

    #[test]
    fn test_new_device_emits_single_event() {
        let inventory = DeviceInventory::new();
        inventory.reconcile(&[device("aa", "10.0.0.1", "A"), device("bb", "10.0.0.2", "B")]);

        // Scan {A, C}: exactly one event (for C), and B persists.
        let events = inventory.reconcile(&[
            device("aa", "10.0.0.1", "A"),
            device("cc", "10.0.0.3", "C"),
        ]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Info);
        assert!(events[0].message.contains("C"));
        assert_eq!(inventory.len(), 3);
        assert!(inventory.contains("bb"));
    }

    #[test]
    fn test_known_device_refreshed_without_event() {
        let inventory = DeviceInventory::new();
        inventory.reconcile(&[device("aa", "10.0.0.1", "A")]);

        let mut updated = device("aa", "10.0.0.1", "A");
        updated.status = DeviceStatus::Warning;
        let events = inventory.reconcile(&[updated]);

        assert!(events.is_empty());
        let snapshot = inventory.snapshot();
        assert_eq!(snapshot[0].status, DeviceStatus::Warning);
    }

    #[test]
    fn test_refresh_ignores_unknown_device() {
        let inventory = DeviceInventory::new();
        inventory.refresh(&device("zz", "10.0.0.9", "Ghost"));
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_snapshot_ordered_by_ip() {
        let inventory = DeviceInventory::new();
        inventory.reconcile(&[
            device("bb", "192.168.1.20", "B"),
            device("aa", "192.168.1.10", "A"),
        ]);
        let snapshot = inventory.snapshot();
        assert_eq!(snapshot[0].name, "A");
        assert_eq!(snapshot[1].name, "B");
    }
}
