#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tonnetz::config::EngineConfig;
use tonnetz::core::clock::ManualClock;
use tonnetz::engine::LatticeEngine;
use tonnetz::engine::snapshot::BlobStore;
use tonnetz::engine::voices::{ToneEngine, VoiceHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum ToneCall {
    Sustain { owner_key: String, freq_hz: f32 },
    Retune { handle: u64, freq_hz: f32, hard_sync: bool },
    Stop { owner_key: String },
    Release { handle: u64 },
    StopAll,
}

/// Recording fake of the external tone engine. Clones share the call
/// log, so a test keeps one handle and hands the engine another.
#[derive(Clone, Default)]
pub struct SharedTone {
    inner: Arc<Mutex<SharedToneInner>>,
}

#[derive(Default)]
struct SharedToneInner {
    calls: Vec<ToneCall>,
    next_handle: u64,
}

impl SharedTone {
    pub fn calls(&self) -> Vec<ToneCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn sustain_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ToneCall::Sustain { .. }))
            .count()
    }

    pub fn stop_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ToneCall::Stop { .. }))
            .count()
    }

    pub fn sustains_for(&self, owner_key: &str) -> Vec<f32> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                ToneCall::Sustain { owner_key: k, freq_hz } if k == owner_key => Some(*freq_hz),
                _ => None,
            })
            .collect()
    }

    pub fn stops_for(&self, owner_key: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ToneCall::Stop { owner_key: k } if k == owner_key))
            .count()
    }

    pub fn retunes(&self) -> Vec<f32> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                ToneCall::Retune { freq_hz, .. } => Some(*freq_hz),
                _ => None,
            })
            .collect()
    }
}

impl ToneEngine for SharedTone {
    fn sustain(
        &mut self,
        freq_hz: f32,
        _amp: f32,
        _owner: &str,
        owner_key: &str,
        _attack_ms: f32,
        _release_ms: f32,
    ) -> VoiceHandle {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ToneCall::Sustain {
            owner_key: owner_key.to_string(),
            freq_hz,
        });
        inner.next_handle += 1;
        VoiceHandle(inner.next_handle)
    }

    fn retune(&mut self, handle: VoiceHandle, freq_hz: f32, hard_sync: bool) {
        self.inner.lock().unwrap().calls.push(ToneCall::Retune {
            handle: handle.0,
            freq_hz,
            hard_sync,
        });
    }

    fn stop(&mut self, owner_key: &str, _release_s: f32) {
        self.inner.lock().unwrap().calls.push(ToneCall::Stop {
            owner_key: owner_key.to_string(),
        });
    }

    fn release(&mut self, handle: VoiceHandle, _release_s: f32) {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(ToneCall::Release { handle: handle.0 });
    }

    fn stop_all(&mut self) {
        self.inner.lock().unwrap().calls.push(ToneCall::StopAll);
    }
}

/// Shared in-memory blob store so a test can reopen "the same" storage
/// with a fresh engine.
#[derive(Clone, Default)]
pub struct SharedStore {
    blobs: Arc<Mutex<BTreeMap<String, String>>>,
}

impl SharedStore {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    pub fn poison(&self, key: &str) {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), "[broken = toml".to_string());
    }
}

impl BlobStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    fn set(&mut self, key: &str, blob: &str) {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), blob.to_string());
    }
}

/// Engine wired to a manual clock and a recording tone engine.
pub fn engine() -> (LatticeEngine, ManualClock, SharedTone) {
    engine_with_config(EngineConfig::default())
}

pub fn engine_with_config(cfg: EngineConfig) -> (LatticeEngine, ManualClock, SharedTone) {
    let clock = ManualClock::new();
    let tone = SharedTone::default();
    let eng = LatticeEngine::new(cfg, Box::new(clock.clone()), Box::new(tone.clone()));
    (eng, clock, tone)
}

/// Step time past the toggle debounce window and pump the engine.
pub fn settle(eng: &mut LatticeEngine, clock: &ManualClock) {
    clock.advance(0.2);
    eng.tick();
}
