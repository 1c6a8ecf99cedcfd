//! Historical threat packet store
//!
//! A bounded FIFO of [`ThreatPacket`]s. Disk persistence is opt-in: a store
//! built with [`PacketStore::in_memory`] never touches the filesystem, and
//! nothing is ever written relative to the working directory.

use crate::error::{AdaptiveError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

/// Default packet capacity
pub const DEFAULT_MAX_PACKETS: usize = 1000;

/// One threat report as recorded by a shield layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatPacket {
    pub source_layer: String,
    pub threat_type: String,
    pub severity: u32,
    pub timestamp: String,
    pub node_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,

    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

/// Bounded FIFO of threat packets with optional JSON file backing
#[derive(Debug, Clone)]
pub struct PacketStore {
    packets: VecDeque<ThreatPacket>,
    max_packets: usize,
    path: Option<PathBuf>,
}

impl PacketStore {
    /// Store that never reads or writes a file
    pub fn in_memory(max_packets: usize) -> Result<Self> {
        Self::build(None, max_packets)
    }

    /// Store persisted to `path` on [`save`](Self::save)
    pub fn with_path(path: impl Into<PathBuf>, max_packets: usize) -> Result<Self> {
        Self::build(Some(path.into()), max_packets)
    }

    fn build(path: Option<PathBuf>, max_packets: usize) -> Result<Self> {
        if max_packets == 0 {
            return Err(AdaptiveError::Config(
                "max_packets must be > 0".to_string(),
            ));
        }
        Ok(Self {
            packets: VecDeque::new(),
            max_packets,
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn max_packets(&self) -> usize {
        self.max_packets
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Append a packet, evicting the oldest when full
    pub fn add(&mut self, packet: ThreatPacket) {
        self.packets.push_back(packet);
        while self.packets.len() > self.max_packets {
            self.packets.pop_front();
        }
    }

    /// Copy of all packets, oldest first
    pub fn packets(&self) -> Vec<ThreatPacket> {
        self.packets.iter().cloned().collect()
    }

    /// Drop all in-memory packets; the file is left alone
    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Write all packets as a JSON array (temp file + rename)
    ///
    /// No-op for in-memory stores.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.packets)?;
        let tmp_path = path.with_extension("tmp");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AdaptiveError::Storage(format!(
                    "Failed to create packet directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        std::fs::write(&tmp_path, json).map_err(|e| {
            AdaptiveError::Storage(format!(
                "Failed to write packet file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        std::fs::rename(&tmp_path, path).map_err(|e| {
            AdaptiveError::Storage(format!(
                "Failed to rename packet file {} → {}: {}",
                tmp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), count = self.packets.len(), "Packets saved");
        Ok(())
    }

    /// Replace the in-memory packets with the file contents
    ///
    /// A missing file empties the store. Entries that do not parse as
    /// packets are skipped; only the newest `max_packets` are kept.
    /// No-op for in-memory stores.
    pub fn load(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if !path.exists() {
            self.packets.clear();
            return Ok(());
        }

        let json = std::fs::read_to_string(path).map_err(|e| {
            AdaptiveError::Storage(format!(
                "Failed to read packet file {}: {}",
                path.display(),
                e
            ))
        })?;

        let root: Value = serde_json::from_str(&json).map_err(|e| {
            AdaptiveError::Storage(format!(
                "Failed to parse packet file {}: {}",
                path.display(),
                e
            ))
        })?;
        let Value::Array(entries) = root else {
            return Err(AdaptiveError::Storage(format!(
                "Packet file {} must hold a JSON array",
                path.display()
            )));
        };

        let mut packets = VecDeque::with_capacity(entries.len().min(self.max_packets));
        let mut skipped = 0usize;
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<ThreatPacket>(entry) {
                Ok(packet) => packets.push_back(packet),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(path = %path.display(), index, error = %e, "Skipping malformed packet");
                }
            }
        }
        while packets.len() > self.max_packets {
            packets.pop_front();
        }

        tracing::debug!(
            path = %path.display(),
            count = packets.len(),
            skipped,
            "Packets loaded"
        );
        self.packets = packets;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasonCode;
    use serde_json::json;

    fn packet(i: u64) -> ThreatPacket {
        ThreatPacket {
            source_layer: "sentinel".to_string(),
            threat_type: "test_threat".to_string(),
            severity: 5,
            timestamp: "2026-01-14T00:00:00Z".to_string(),
            node_id: format!("node-{}", i),
            wallet_id: None,
            tx_id: None,
            block_height: Some(i),
            meta: BTreeMap::from([("index".to_string(), json!(i))]),
        }
    }

    #[test]
    fn test_fifo_eviction() {
        let mut store = PacketStore::in_memory(2).unwrap();
        for i in 1..=3 {
            store.add(packet(i));
        }
        let heights: Vec<_> = store.packets().iter().map(|p| p.block_height.unwrap()).collect();
        assert_eq!(heights, vec![2, 3]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = PacketStore::in_memory(0).unwrap_err();
        assert_eq!(err.code(), ReasonCode::ConfigInvalid);
    }

    #[test]
    fn test_in_memory_never_touches_disk() {
        let mut store = PacketStore::in_memory(10).unwrap();
        store.add(packet(1));
        store.save().unwrap();
        store.load().unwrap();
        assert!(store.path().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_save_load_prunes_to_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packets.json");

        let mut store = PacketStore::with_path(&path, 200).unwrap();
        for i in 0..150 {
            store.add(packet(i));
        }
        store.save().unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert!(std::fs::read_to_string(&path).unwrap().trim_start().starts_with('['));

        let mut reloaded = PacketStore::with_path(&path, 100).unwrap();
        reloaded.load().unwrap();
        assert_eq!(reloaded.len(), 100);
        assert_eq!(reloaded.packets()[0].block_height, Some(50));
    }

    #[test]
    fn test_load_skips_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packets.json");
        let good = serde_json::to_value(packet(7)).unwrap();
        std::fs::write(
            &path,
            serde_json::to_string(&json!([good, {"severity": "high"}, 42])).unwrap(),
        )
        .unwrap();

        let mut store = PacketStore::with_path(&path, 10).unwrap();
        store.load().unwrap();
        assert_eq!(store.packets(), vec![packet(7)]);
    }

    #[test]
    fn test_missing_file_empties_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PacketStore::with_path(dir.path().join("absent.json"), 10).unwrap();
        store.add(packet(1));
        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_array_root_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packets.json");
        std::fs::write(&path, r#"{"packets": []}"#).unwrap();

        let mut store = PacketStore::with_path(&path, 10).unwrap();
        let err = store.load().unwrap_err();
        assert_eq!(err.code(), ReasonCode::StorageFailed);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/packets.json");
        let store = PacketStore::with_path(&path, 10).unwrap();
        store.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_clear_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packets.json");
        let mut store = PacketStore::with_path(&path, 10).unwrap();
        store.add(packet(1));
        store.save().unwrap();
        store.clear();
        assert!(store.is_empty());

        store.load().unwrap();
        assert_eq!(store.len(), 1);
    }
}
