// src/engine/voices.rs
//
// The single authority for sounding voices. Everything else only states
// what it wants selected; this module diffs desire against the bound
// voice map and speaks to the external tone engine.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::coord::SelectionKey;

/// Opaque handle issued by the tone engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoiceHandle(pub u64);

/// Contract of the external polyphonic tone engine. `owner_key` is a
/// stable per-node string so stop-by-key stays idempotent even when the
/// handle was lost.
pub trait ToneEngine: Send {
    fn sustain(
        &mut self,
        freq_hz: f32,
        amp: f32,
        owner: &str,
        owner_key: &str,
        attack_ms: f32,
        release_ms: f32,
    ) -> VoiceHandle;
    fn retune(&mut self, handle: VoiceHandle, freq_hz: f32, hard_sync: bool);
    fn stop(&mut self, owner_key: &str, release_s: f32);
    fn release(&mut self, handle: VoiceHandle, release_s: f32);
    fn stop_all(&mut self);
}

const OWNER: &str = "lattice";
const RETUNE_EPSILON_HZ: f32 = 1e-3;

#[derive(Debug, Clone, Copy)]
struct BoundVoice {
    handle: VoiceHandle,
    freq_hz: f32,
}

/// Envelope timings handed to the tone engine, user-configured.
#[derive(Debug, Clone, Copy)]
pub struct VoiceParams {
    pub amp: f32,
    pub attack_s: f32,
    pub release_s: f32,
}

#[derive(Debug, Default)]
pub struct VoiceReconciler {
    bound: BTreeMap<SelectionKey, BoundVoice>,
    paused: BTreeMap<SelectionKey, f32>,
}

impl VoiceReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the full voice set from the desired `(key, freq)` list.
    ///
    /// Starts what is desired and unbound, stops what is bound and no
    /// longer desired, retunes bound voices whose frequency drifted, and
    /// leaves exact matches untouched. Keys paused for a preview are
    /// skipped on the start side. `force_rebuild` hard-stops everything
    /// first so no orphan survives a disable/enable cycle.
    pub fn resync(
        &mut self,
        tone: &mut dyn ToneEngine,
        desired: &[(SelectionKey, f32)],
        effective_enabled: bool,
        force_rebuild: bool,
        params: VoiceParams,
        reason: &str,
    ) {
        debug!(
            desired = desired.len(),
            bound = self.bound.len(),
            effective_enabled,
            force_rebuild,
            reason,
            "voice resync"
        );

        if !effective_enabled || force_rebuild {
            for (key, _) in std::mem::take(&mut self.bound) {
                tone.stop(&key.owner_key(), params.release_s);
            }
            if force_rebuild {
                tone.stop_all();
            }
            if !effective_enabled {
                self.paused.clear();
                return;
            }
        }

        // stops: bound but no longer desired
        let stale: Vec<SelectionKey> = self
            .bound
            .keys()
            .filter(|k| !desired.iter().any(|(d, _)| d == *k))
            .copied()
            .collect();
        for key in stale {
            self.bound.remove(&key);
            tone.stop(&key.owner_key(), params.release_s);
        }

        // starts and retunes, in selection order
        for &(key, freq_hz) in desired {
            if self.paused.contains_key(&key) {
                continue;
            }
            match self.bound.get(&key) {
                None => {
                    let handle = tone.sustain(
                        freq_hz,
                        params.amp,
                        OWNER,
                        &key.owner_key(),
                        params.attack_s * 1000.0,
                        params.release_s * 1000.0,
                    );
                    self.bound.insert(key, BoundVoice { handle, freq_hz });
                }
                Some(v) if (v.freq_hz - freq_hz).abs() > RETUNE_EPSILON_HZ => {
                    tone.retune(v.handle, freq_hz, false);
                    if let Some(v) = self.bound.get_mut(&key) {
                        v.freq_hz = freq_hz;
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Debounced single-node commit, fired after the coalescing window.
    /// `desired_freq` is `Some` iff the node should be sounding now; the
    /// commit compares that against the binding and acts once.
    pub fn commit_one(
        &mut self,
        tone: &mut dyn ToneEngine,
        key: SelectionKey,
        desired_freq: Option<f32>,
        effective_enabled: bool,
        params: VoiceParams,
    ) {
        if self.paused.contains_key(&key) {
            return;
        }
        match (desired_freq, self.bound.contains_key(&key)) {
            (Some(freq_hz), false) if effective_enabled => {
                let handle = tone.sustain(
                    freq_hz,
                    params.amp,
                    OWNER,
                    &key.owner_key(),
                    params.attack_s * 1000.0,
                    params.release_s * 1000.0,
                );
                self.bound.insert(key, BoundVoice { handle, freq_hz });
            }
            (None, true) | (Some(_), true) if !effective_enabled => {
                self.bound.remove(&key);
                tone.stop(&key.owner_key(), params.release_s);
            }
            (None, true) => {
                self.bound.remove(&key);
                tone.stop(&key.owner_key(), params.release_s);
            }
            _ => {}
        }
    }

    /// Pause a node's sustain for a transient preview. The binding is
    /// released but remembered with its frequency, distinguishing
    /// "paused" from "deselected".
    pub fn pause_for_preview(&mut self, tone: &mut dyn ToneEngine, key: SelectionKey) {
        if let Some(v) = self.bound.remove(&key) {
            tone.release(v.handle, 0.05);
            self.paused.insert(key, v.freq_hz);
        }
    }

    /// Resume a paused node at its original frequency. No-op when the
    /// node was deselected while the preview ran.
    pub fn resume_after_preview(
        &mut self,
        tone: &mut dyn ToneEngine,
        key: SelectionKey,
        still_selected: bool,
        params: VoiceParams,
    ) {
        let Some(freq_hz) = self.paused.remove(&key) else {
            return;
        };
        if !still_selected {
            return;
        }
        let handle = tone.sustain(
            freq_hz,
            params.amp,
            OWNER,
            &key.owner_key(),
            params.attack_s * 1000.0,
            params.release_s * 1000.0,
        );
        self.bound.insert(key, BoundVoice { handle, freq_hz });
    }

    pub fn is_bound(&self, key: SelectionKey) -> bool {
        self.bound.contains_key(&key)
    }

    pub fn is_paused(&self, key: SelectionKey) -> bool {
        self.paused.contains_key(&key)
    }

    pub fn sounding_count(&self) -> usize {
        self.bound.len()
    }

    pub fn bound_freq(&self, key: SelectionKey) -> Option<f32> {
        self.bound.get(&key).map(|v| v.freq_hz)
    }
}
