// src/engine/snapshot.rs
//
// The one opaque blob that restores camera/selection state across
// launches. Load is best-effort: anything missing or corrupt falls back
// to defaults, never an error the user sees.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

// TOML maps need string keys, so axis shifts persist as (prime, shift)
// pairs.

use crate::core::camera::Camera;
use crate::core::coord::LatticeCoord;
use crate::engine::settings::LabelMode;

pub const SNAPSHOT_KEY: &str = "tonnetz.lattice.v1";

/// Opaque keyed blob storage supplied by the host application.
pub trait BlobStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, blob: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LatticeSnapshot {
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub pivot: LatticeCoord,
    #[serde(default)]
    pub visible_primes: Vec<u32>,
    #[serde(default)]
    pub axis_shift: Vec<(u32, i32)>,
    #[serde(default)]
    pub label_mode: LabelMode,
    #[serde(default)]
    pub guides: bool,
    #[serde(default)]
    pub audition_enabled: bool,
    /// Plane selection in insertion order.
    #[serde(default)]
    pub selected_plane: Vec<LatticeCoord>,
}

impl LatticeSnapshot {
    pub fn encode(&self) -> Option<String> {
        match toml::to_string(self) {
            Ok(s) => Some(s),
            Err(err) => {
                warn!("snapshot encode failed: {err}");
                None
            }
        }
    }

    pub fn decode(blob: &str) -> Option<Self> {
        match toml::from_str(blob) {
            Ok(s) => Some(s),
            Err(err) => {
                warn!("snapshot decode failed, using defaults: {err}");
                None
            }
        }
    }

    pub fn load(store: &dyn BlobStore) -> Option<Self> {
        Self::decode(&store.get(SNAPSHOT_KEY)?)
    }

    pub fn save(&self, store: &mut dyn BlobStore) {
        if let Some(blob) = self.encode() {
            store.set(SNAPSHOT_KEY, &blob);
        }
    }
}

/// In-memory store, handy for tests and as a default.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.blobs.get(key).cloned()
    }

    fn set(&mut self, key: &str, blob: &str) {
        self.blobs.insert(key.to_string(), blob.to_string());
    }
}
