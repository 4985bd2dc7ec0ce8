// src/engine/settings.rs
//
// Typed settings intake. The engine reacts to these; it never publishes
// settings itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelMode {
    Ratio,
    Cents,
    Monzo,
}

impl Default for LabelMode {
    fn default() -> Self {
        Self::Ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomPreset {
    Near,
    Mid,
    Far,
}

impl Default for ZoomPreset {
    fn default() -> Self {
        Self::Mid
    }
}

impl ZoomPreset {
    /// Pixels per world unit.
    pub fn scale(self) -> f32 {
        match self {
            Self::Near => 160.0,
            Self::Mid => 90.0,
            Self::Far => 48.0,
        }
    }
}

/// Events the engine subscribes to from the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    LabelMode(LabelMode),
    PrimeVisibleDefault { prime: u32, visible: bool },
    Guides(bool),
    AuditionEnabled(bool),
    LatticeSoundEnabled(bool),
    ZoomPreset(ZoomPreset),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub label_mode: LabelMode,
    #[serde(default = "Settings::default_guides")]
    pub guides: bool,
    #[serde(default = "Settings::default_audition_enabled")]
    pub audition_enabled: bool,
    #[serde(default = "Settings::default_lattice_sound_enabled")]
    pub lattice_sound_enabled: bool,
    #[serde(default)]
    pub zoom_preset: ZoomPreset,
    #[serde(default)]
    pub prime_default_visible: BTreeMap<u32, bool>,
}

impl Settings {
    fn default_guides() -> bool {
        true
    }
    fn default_audition_enabled() -> bool {
        true
    }
    fn default_lattice_sound_enabled() -> bool {
        true
    }

    /// Sound only plays when both the audition master and the lattice
    /// sound toggle agree.
    pub fn effective_sound(&self) -> bool {
        self.audition_enabled && self.lattice_sound_enabled
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            label_mode: LabelMode::default(),
            guides: Self::default_guides(),
            audition_enabled: Self::default_audition_enabled(),
            lattice_sound_enabled: Self::default_lattice_sound_enabled(),
            zoom_preset: ZoomPreset::default(),
            prime_default_visible: BTreeMap::new(),
        }
    }
}
