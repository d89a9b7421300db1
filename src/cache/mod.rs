//! Persisted read-through cache for the last-known vault and item lists
//!
//! Two fixed slots, each a small JSON file holding the payload plus its
//! capture timestamp. Entries older than the TTL read as absent, never
//! stale; an undeserializable slot also reads as absent rather than
//! erroring, since the cache only exists to speed up first paint.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{CachedData, Item, Vault};

/// Slot lifetime. Anything older is treated as absent.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

const VAULTS_SLOT: &str = "pass_vaults";
const ITEMS_SLOT: &str = "pass_items";

/// Local store of the last successfully fetched vault and item lists.
pub struct Store {
    dir: PathBuf,
    ttl: Duration,
}

impl Store {
    /// Open the store at the platform cache directory.
    pub fn open_default() -> Self {
        let dir = dirs::cache_dir()
            .map(|d| d.join("passdeck"))
            .unwrap_or_else(|| PathBuf::from(".passdeck-cache"));
        Self::new(dir, CACHE_TTL)
    }

    /// Open the store at an explicit directory with an explicit TTL.
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        Self { dir, ttl }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: &str) -> Option<T> {
        let raw = fs::read_to_string(self.slot_path(slot)).ok()?;
        let cached: CachedData<T> = serde_json::from_str(&raw).ok()?;
        let age_ms = Utc::now().timestamp_millis() - cached.timestamp;
        if age_ms < self.ttl.as_millis() as i64 {
            tracing::debug!(slot = slot, age_ms = age_ms, "cache hit");
            Some(cached.data)
        } else {
            tracing::debug!(slot = slot, age_ms = age_ms, "cache miss (expired)");
            None
        }
    }

    /// Writes stamp the current time and unconditionally overwrite.
    /// A write failure is logged, not surfaced; the fetch it followed
    /// already succeeded.
    fn write_slot<T: Serialize>(&self, slot: &str, data: &T) {
        let cached = CachedData {
            data,
            timestamp: Utc::now().timestamp_millis(),
        };
        let result = fs::create_dir_all(&self.dir).and_then(|()| {
            let body = serde_json::to_string(&cached)?;
            fs::write(self.slot_path(slot), body)
        });
        match result {
            Ok(()) => tracing::debug!(slot = slot, "cache slot written"),
            Err(e) => tracing::warn!(slot = slot, error = %e, "failed to write cache slot"),
        }
    }

    /// Last-known vault list, if fresh.
    pub fn vaults(&self) -> Option<Vec<Vault>> {
        self.read_slot(VAULTS_SLOT)
    }

    pub fn write_vaults(&self, vaults: &[Vault]) {
        self.write_slot(VAULTS_SLOT, &vaults);
    }

    /// Last-known flat item list, if fresh.
    pub fn items(&self) -> Option<Vec<Item>> {
        self.read_slot(ITEMS_SLOT)
    }

    pub fn write_items(&self, items: &[Item]) {
        self.write_slot(ITEMS_SLOT, &items);
    }

    /// Remove both slots. Used when switching into synthetic-data mode,
    /// so no stale real data leaks into it.
    pub fn clear(&self) {
        for slot in [VAULTS_SLOT, ITEMS_SLOT] {
            match fs::remove_file(self.slot_path(slot)) {
                Ok(()) => tracing::debug!(slot = slot, "cache slot cleared"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(slot = slot, error = %e, "failed to clear cache slot"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VaultRole;
    use tempfile::TempDir;

    fn sample_vaults() -> Vec<Vault> {
        vec![Vault {
            share_id: "s1".into(),
            name: "Personal".into(),
            item_count: 4,
            role: VaultRole::Owner,
        }]
    }

    #[test]
    fn round_trip_within_ttl() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);

        assert!(store.vaults().is_none());
        store.write_vaults(&sample_vaults());
        assert_eq!(store.vaults().unwrap(), sample_vaults());
    }

    #[test]
    fn aged_timestamp_reads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);
        store.write_vaults(&sample_vaults());

        // Rewrite the slot with a timestamp past the TTL.
        let path = tmp.path().join("pass_vaults.json");
        let raw = fs::read_to_string(&path).unwrap();
        let mut cached: CachedData<Vec<Vault>> = serde_json::from_str(&raw).unwrap();
        cached.timestamp -= CACHE_TTL.as_millis() as i64 + 1_000;
        fs::write(&path, serde_json::to_string(&cached).unwrap()).unwrap();

        assert!(store.vaults().is_none());
    }

    #[test]
    fn corrupt_slot_reads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);
        fs::create_dir_all(tmp.path()).unwrap();
        fs::write(tmp.path().join("pass_items.json"), "{ not json").unwrap();

        assert!(store.items().is_none());
    }

    #[test]
    fn write_overwrites_previous_slot() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);

        store.write_vaults(&sample_vaults());
        let mut replaced = sample_vaults();
        replaced[0].name = "Renamed".into();
        store.write_vaults(&replaced);

        assert_eq!(store.vaults().unwrap()[0].name, "Renamed");
    }

    #[test]
    fn clear_removes_both_slots() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);
        store.write_vaults(&sample_vaults());
        store.write_items(&[]);

        store.clear();
        assert!(store.vaults().is_none());
        assert!(store.items().is_none());
        // Clearing an already-empty store is fine.
        store.clear();
    }
}
