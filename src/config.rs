use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Attack time for sustained lattice voices, seconds.
    #[serde(default = "EnvelopeConfig::default_attack_s")]
    pub attack_s: f32,
    /// Release time, seconds. Also the ring animation duration.
    #[serde(default = "EnvelopeConfig::default_release_s")]
    pub release_s: f32,
    #[serde(default = "EnvelopeConfig::default_amp")]
    pub amp: f32,
}

impl EnvelopeConfig {
    fn default_attack_s() -> f32 {
        0.22
    }
    fn default_release_s() -> f32 {
        0.22
    }
    fn default_amp() -> f32 {
        0.2
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack_s: Self::default_attack_s(),
            release_s: Self::default_release_s(),
            amp: Self::default_amp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Coalescing window for rapid toggles on one node, milliseconds.
    #[serde(default = "InteractionConfig::default_debounce_ms")]
    pub debounce_ms: f32,
    /// Screen-space tap radius, pixels.
    #[serde(default = "InteractionConfig::default_tap_radius_px")]
    pub tap_radius_px: f32,
    /// Quiet period before the state snapshot is persisted, milliseconds.
    #[serde(default = "InteractionConfig::default_snapshot_debounce_ms")]
    pub snapshot_debounce_ms: f32,
}

impl InteractionConfig {
    fn default_debounce_ms() -> f32 {
        120.0
    }
    fn default_tap_radius_px() -> f32 {
        18.0
    }
    fn default_snapshot_debounce_ms() -> f32 {
        700.0
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
            tap_radius_px: Self::default_tap_radius_px(),
            snapshot_debounce_ms: Self::default_snapshot_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Tonic used when no root frequency provider is installed, Hz.
    #[serde(default = "TuningConfig::default_root_hz")]
    pub default_root_hz: f32,
    /// Undo log depth; the oldest action falls off beyond this.
    #[serde(default = "TuningConfig::default_undo_cap")]
    pub undo_cap: usize,
}

impl TuningConfig {
    fn default_root_hz() -> f32 {
        261.625_55
    }
    fn default_undo_cap() -> usize {
        200
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            default_root_hz: Self::default_root_hz(),
            undo_cap: Self::default_undo_cap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub envelope: EnvelopeConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
}

impl EngineConfig {
    pub fn debounce_s(&self) -> f64 {
        self.interaction.debounce_ms as f64 / 1000.0
    }

    pub fn snapshot_debounce_s(&self) -> f64 {
        self.interaction.snapshot_debounce_ms as f64 / 1000.0
    }

    /// Read a config file, falling back to defaults on any problem. A
    /// missing file is written back as commented defaults so users can
    /// see the knobs.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        let default_cfg = Self::default();
        if let Ok(text) = toml::to_string_pretty(&default_cfg) {
            let mut commented = String::new();
            for line in text.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
                    commented.push_str(line);
                } else {
                    commented.push_str("# ");
                    commented.push_str(line);
                }
                commented.push('\n');
            }
            if let Err(err) = fs::write(path_obj, commented) {
                eprintln!("Failed to write default config to {path}: {err}");
            }
        } else {
            eprintln!("Failed to serialize default config; continuing with defaults");
        }
        default_cfg
    }
}
