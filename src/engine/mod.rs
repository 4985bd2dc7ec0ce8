// src/engine/mod.rs
//
// The lattice engine facade. Owns every piece of mutable state
// (selection, animation phases, voice bindings, camera, settings) on one
// cooperative thread; the host calls `tick()` once per frame and reads
// through accessors. External collaborators (tone engine, root pitch,
// blob store) come in as trait objects at construction.

pub mod anim;
pub mod defer;
pub mod hit;
pub mod selection;
pub mod settings;
pub mod snapshot;
pub mod voices;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::core::camera::{self, Camera};
use crate::core::clock::Clock;
use crate::core::coord::{GhostMonzo, LatticeCoord, SelectionKey};
use crate::core::layout::{Vec2, plane_position};
use crate::core::ratio::{RatioRef, canonicalize, cents, fraction_from_exponents, with_octave};
use anim::{EXPIRY_SLACK, PhaseMap, Phase, ink_duration};
use defer::{DeferredQueue, TaskKey};
use hit::HitContext;
use selection::{Change, SelectionState};
use settings::{LabelMode, Settings, SettingsEvent};
use snapshot::{BlobStore, LatticeSnapshot};
use voices::{ToneEngine, VoiceParams, VoiceReconciler};

/// Pushed to subscribers whenever selection membership changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChanged {
    pub selected_count: usize,
}

pub struct LatticeEngine {
    cfg: EngineConfig,
    clock: Box<dyn Clock>,
    tone: Box<dyn ToneEngine>,
    root_hz: Box<dyn Fn() -> f32 + Send>,
    store: Option<Box<dyn BlobStore>>,
    selection: SelectionState,
    anim: PhaseMap,
    voices: VoiceReconciler,
    defer: DeferredQueue,
    camera: Camera,
    settings: Settings,
    visible_primes: BTreeSet<u32>,
    settings_tx: Sender<SettingsEvent>,
    settings_rx: Receiver<SettingsEvent>,
    selection_subscribers: Vec<Sender<SelectionChanged>>,
}

impl LatticeEngine {
    pub fn new(cfg: EngineConfig, clock: Box<dyn Clock>, tone: Box<dyn ToneEngine>) -> Self {
        let (settings_tx, settings_rx) = unbounded();
        let default_root = cfg.tuning.default_root_hz;
        Self {
            selection: SelectionState::new(cfg.tuning.undo_cap),
            cfg,
            clock,
            tone,
            root_hz: Box::new(move || default_root),
            store: None,
            anim: PhaseMap::new(),
            voices: VoiceReconciler::new(),
            defer: DeferredQueue::new(),
            camera: Camera::default(),
            settings: Settings::default(),
            visible_primes: BTreeSet::new(),
            settings_tx,
            settings_rx,
            selection_subscribers: Vec::new(),
        }
    }

    /// Install the tonic provider. Without one, the configured default
    /// root is used.
    pub fn set_root_frequency_provider(&mut self, provider: Box<dyn Fn() -> f32 + Send>) {
        self.root_hz = provider;
    }

    /// Attach persistence and restore any saved state from it.
    pub fn attach_store(&mut self, store: Box<dyn BlobStore>) {
        self.store = Some(store);
        self.restore_from_store();
    }

    /// Sender half for the application's settings bus. The engine only
    /// ever consumes these.
    pub fn settings_sender(&self) -> Sender<SettingsEvent> {
        self.settings_tx.clone()
    }

    pub fn subscribe_selection(&mut self) -> Receiver<SelectionChanged> {
        let (tx, rx) = unbounded();
        self.selection_subscribers.push(tx);
        rx
    }

    // --- frame pump ---

    /// Run one cooperative frame: drain settings events, then fire every
    /// deferred task that has come due.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        while let Ok(ev) = self.settings_rx.try_recv() {
            self.apply_settings_event(ev, now);
        }
        for task in self.defer.take_due(now) {
            match task {
                TaskKey::VoiceCommit(key) => self.commit_voice(key),
                TaskKey::AnimSweep => {
                    if let Some(next) = self.anim.sweep(now) {
                        self.defer.schedule(TaskKey::AnimSweep, next);
                    }
                }
                TaskKey::PreviewResume(key) => self.finish_preview(key),
                TaskKey::SnapshotSave => self.save_snapshot_now(),
            }
        }
    }

    // --- selection operations ---

    pub fn toggle_selection(&mut self, coord: LatticeCoord) {
        let now = self.clock.now();
        let change = self.selection.toggle_plane(coord);
        self.after_changes(now, &[change], "toggle-plane");
    }

    pub fn toggle_overlay(&mut self, prime: u32, e3: i32, e5: i32, exponent: i32) {
        let now = self.clock.now();
        let change = self
            .selection
            .toggle_ghost(GhostMonzo::new(prime, e3, e5, exponent));
        self.after_changes(now, &[change], "toggle-ghost");
    }

    pub fn clear_selection(&mut self) {
        let now = self.clock.now();
        let changes = self.selection.clear();
        if changes.is_empty() {
            return;
        }
        info!(count = changes.len(), "clear selection");
        self.after_changes(now, &changes, "clear");
    }

    pub fn shift(&mut self, prime: u32, delta: i32) {
        let now = self.clock.now();
        if let Some(change) = self.selection.shift(prime, delta) {
            self.after_changes(now, &[change], "shift");
        }
    }

    pub fn reset_shift(&mut self, prime: Option<u32>) {
        let now = self.clock.now();
        let changes = self.selection.reset_shift(prime);
        if !changes.is_empty() {
            self.after_changes(now, &changes, "reset-shift");
        }
    }

    pub fn set_pivot(&mut self, pivot: LatticeCoord) {
        let now = self.clock.now();
        self.selection.set_pivot(pivot);
        self.resync_now(false, "pivot");
        self.mark_dirty(now);
    }

    pub fn set_octave_offset(&mut self, key: SelectionKey, offset: i32) {
        let now = self.clock.now();
        if self.selection.set_octave_offset(key, offset) {
            self.resync_now(false, "octave-offset");
            self.mark_dirty(now);
        }
    }

    pub fn undo(&mut self) {
        let now = self.clock.now();
        if let Some(change) = self.selection.undo() {
            self.after_changes(now, &[change], "undo");
        }
    }

    pub fn redo(&mut self) {
        let now = self.clock.now();
        if let Some(change) = self.selection.redo() {
            self.after_changes(now, &[change], "redo");
        }
    }

    pub fn begin_staging(&mut self) {
        self.selection.begin_staging();
    }

    pub fn additions_since_baseline(&self) -> usize {
        self.selection.additions_since_baseline()
    }

    /// Shared post-mutation path: animation entries, debounced voice
    /// commits, change notification, dirty snapshot.
    fn after_changes(&mut self, now: f64, changes: &[Change], reason: &str) {
        let mut toggled = false;
        let mut shifted = false;
        for change in changes {
            match *change {
                Change::Toggled { key, now_on } => {
                    toggled = true;
                    let duration = if now_on {
                        self.cfg.envelope.attack_s
                    } else {
                        self.cfg.envelope.release_s
                    };
                    self.anim.start_ring(key, now, now_on, duration);
                    self.defer
                        .schedule(TaskKey::AnimSweep, now + duration as f64 + EXPIRY_SLACK);
                    self.defer
                        .schedule(TaskKey::VoiceCommit(key), now + self.cfg.debounce_s());
                }
                Change::Shifted { prime, shift } => {
                    shifted = true;
                    debug!(prime, shift, reason, "axis shift");
                }
            }
        }
        if shifted {
            self.resync_now(false, reason);
        }
        if toggled {
            self.selection.normalize();
            self.notify_selection_changed();
        }
        self.mark_dirty(now);
    }

    fn notify_selection_changed(&mut self) {
        let msg = SelectionChanged {
            selected_count: self.selection.selected_count(),
        };
        self.selection_subscribers
            .retain(|tx| tx.send(msg).is_ok());
    }

    fn mark_dirty(&mut self, now: f64) {
        if self.store.is_some() {
            self.defer
                .schedule(TaskKey::SnapshotSave, now + self.cfg.snapshot_debounce_s());
        }
    }

    // --- ratio / frequency derivation ---

    /// Canonical fraction for a node under the current pivot and axis
    /// shifts. `None` when the exponents overflow integer range.
    pub fn fraction_for(&self, key: SelectionKey) -> Option<(u64, u64)> {
        let s = |p: u32| self.selection.axis_shift(p);
        let pairs: Vec<(u32, i32)> = match key {
            SelectionKey::Plane(c) => {
                let pivot = self.selection.pivot();
                vec![
                    (3, c.e3 - pivot.e3 + s(3)),
                    (5, c.e5 - pivot.e5 + s(5)),
                ]
            }
            SelectionKey::Ghost(g) => vec![
                (3, g.e3 + s(3)),
                (5, g.e5 + s(5)),
                (g.prime, g.exponent + s(g.prime)),
            ],
        };
        let (num, den) = fraction_from_exponents(&pairs)?;
        canonicalize(num, den)
    }

    /// Audible frequency for a node: canonical ratio times the root,
    /// octave offset baked in.
    pub fn frequency_for(&self, key: SelectionKey) -> Option<f32> {
        let (num, den) = self.fraction_for(key)?;
        let (num, den) = with_octave(num, den, self.selection.octave_offset(key))?;
        let ratio = num as f64 / den as f64;
        let freq = (self.root_hz)() as f64 * ratio;
        if freq.is_finite() && freq > 0.0 {
            Some(freq as f32)
        } else {
            None
        }
    }

    /// Display label for a node under the current label mode. `None`
    /// when the ratio overflows.
    pub fn label_for(&self, key: SelectionKey) -> Option<String> {
        let (num, den) = self.fraction_for(key)?;
        Some(match self.settings.label_mode {
            LabelMode::Ratio => format!("{num}/{den}"),
            LabelMode::Cents => format!("{:.1}", cents(num, den)),
            LabelMode::Monzo => match key {
                SelectionKey::Plane(c) => {
                    let pivot = self.selection.pivot();
                    format!(
                        "[{} {}⟩",
                        c.e3 - pivot.e3 + self.selection.axis_shift(3),
                        c.e5 - pivot.e5 + self.selection.axis_shift(5)
                    )
                }
                SelectionKey::Ghost(g) => format!(
                    "[{} {} {}⟩",
                    g.e3 + self.selection.axis_shift(3),
                    g.e5 + self.selection.axis_shift(5),
                    g.exponent + self.selection.axis_shift(g.prime)
                ),
            },
        })
    }

    /// Ordered plane+overlay ratios with octaves baked in, for the scale
    /// builder. Nodes whose ratio overflows are skipped.
    pub fn selection_refs(&self) -> Vec<RatioRef> {
        self.selection
            .order_keys()
            .iter()
            .filter_map(|&key| {
                let (num, den) = self.fraction_for(key)?;
                let (num, den) = with_octave(num, den, self.selection.octave_offset(key))?;
                Some(RatioRef { key, num, den })
            })
            .collect()
    }

    // --- voices ---

    fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            amp: self.cfg.envelope.amp,
            attack_s: self.cfg.envelope.attack_s,
            release_s: self.cfg.envelope.release_s,
        }
    }

    /// Debounced per-node commit, fired by `tick` after the coalescing
    /// window.
    fn commit_voice(&mut self, key: SelectionKey) {
        let desired = if self.selection.is_selected(key) {
            self.frequency_for(key)
        } else {
            None
        };
        let params = self.voice_params();
        self.voices.commit_one(
            &mut *self.tone,
            key,
            desired,
            self.settings.effective_sound(),
            params,
        );
    }

    /// Full-diff resync: the single authority for voice state across
    /// batch mutations, retunes, and enable/disable flips.
    fn resync_now(&mut self, force_rebuild: bool, reason: &str) {
        self.selection.normalize();
        let desired: Vec<(SelectionKey, f32)> = self
            .selection
            .order_keys()
            .iter()
            .filter_map(|&key| Some((key, self.frequency_for(key)?)))
            .collect();
        let params = self.voice_params();
        self.voices.resync(
            &mut *self.tone,
            &desired,
            self.settings.effective_sound(),
            force_rebuild,
            params,
            reason,
        );
    }

    /// Sound a transient inspection tone for a node, pausing (not
    /// stopping) its sustain until the preview ends.
    pub fn preview(&mut self, key: SelectionKey, duration_s: f64) {
        let now = self.clock.now();
        self.voices.pause_for_preview(&mut *self.tone, key);
        if self.settings.effective_sound()
            && let Some(freq) = self.frequency_for(key)
        {
            let params = self.voice_params();
            let owner_key = preview_owner_key(key);
            self.tone.sustain(
                freq,
                params.amp,
                "preview",
                &owner_key,
                30.0,
                params.release_s * 1000.0,
            );
        }
        self.defer
            .schedule(TaskKey::PreviewResume(key), now + duration_s.max(0.0));
    }

    fn finish_preview(&mut self, key: SelectionKey) {
        let params = self.voice_params();
        self.tone
            .stop(&preview_owner_key(key), params.release_s);
        let still_selected = self.selection.is_selected(key);
        self.voices
            .resume_after_preview(&mut *self.tone, key, still_selected, params);
    }

    // --- overlay visibility / animation queries ---

    pub fn set_prime_visible(&mut self, prime: u32, visible: bool) {
        let now = self.clock.now();
        let changed = if visible {
            self.visible_primes.insert(prime)
        } else {
            self.visible_primes.remove(&prime)
        };
        if !changed {
            return;
        }
        let duration = ink_duration(self.camera.zoom_norm(), visible);
        self.anim.start_ink(prime, now, visible, duration);
        self.defer
            .schedule(TaskKey::AnimSweep, now + duration as f64 + EXPIRY_SLACK);
        self.mark_dirty(now);
    }

    pub fn ring_phase(&self, key: SelectionKey) -> Option<Phase> {
        self.anim.ring_phase(key, self.clock.now())
    }

    pub fn visible_primes(&self) -> &BTreeSet<u32> {
        &self.visible_primes
    }

    // --- camera / view ---

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn pan(&mut self, delta_px: Vec2) {
        let now = self.clock.now();
        self.camera.pan(delta_px);
        self.mark_dirty(now);
    }

    pub fn zoom_about(&mut self, factor: f32, screen_pt: Vec2, viewport: Vec2) {
        let now = self.clock.now();
        self.camera.zoom_about(factor, screen_pt, viewport);
        self.mark_dirty(now);
    }

    /// Center on the pivot at the configured zoom preset, capped so the
    /// pivot's immediate neighborhood stays on screen in small viewports.
    pub fn reset_view(&mut self, viewport: Vec2) {
        let now = self.clock.now();
        let fit = (viewport.x.min(viewport.y) / 3.0).max(camera::MIN_SCALE);
        let scale = self.settings.zoom_preset.scale().min(fit);
        self.camera.reset(plane_position(self.selection.pivot()), scale);
        self.mark_dirty(now);
    }

    /// Resolve a screen point to the nearest addressable node.
    pub fn hit_test(&self, screen: Vec2, viewport: Vec2) -> Option<SelectionKey> {
        let ctx = HitContext {
            camera: &self.camera,
            pivot: self.selection.pivot(),
            visible_primes: &self.visible_primes,
            anim: &self.anim,
            tap_radius_px: self.cfg.interaction.tap_radius_px,
            now: self.clock.now(),
        };
        ctx.resolve(screen, viewport)
    }

    // --- settings ---

    fn apply_settings_event(&mut self, ev: SettingsEvent, now: f64) {
        debug!(?ev, "settings event");
        match ev {
            SettingsEvent::LabelMode(mode) => self.settings.label_mode = mode,
            SettingsEvent::Guides(on) => self.settings.guides = on,
            SettingsEvent::ZoomPreset(preset) => self.settings.zoom_preset = preset,
            SettingsEvent::PrimeVisibleDefault { prime, visible } => {
                self.settings.prime_default_visible.insert(prime, visible);
                self.set_prime_visible(prime, visible);
            }
            SettingsEvent::AuditionEnabled(on) => {
                self.settings.audition_enabled = on;
                self.resync_now(true, "audition-toggle");
                self.mark_dirty(now);
            }
            SettingsEvent::LatticeSoundEnabled(on) => {
                self.settings.lattice_sound_enabled = on;
                self.resync_now(true, "lattice-sound-toggle");
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // --- persistence ---

    fn current_snapshot(&self) -> LatticeSnapshot {
        LatticeSnapshot {
            camera: self.camera,
            pivot: self.selection.pivot(),
            visible_primes: self.visible_primes.iter().copied().collect(),
            axis_shift: self
                .selection
                .axis_shifts()
                .iter()
                .map(|(&p, &s)| (p, s))
                .collect(),
            label_mode: self.settings.label_mode,
            guides: self.settings.guides,
            audition_enabled: self.settings.audition_enabled,
            selected_plane: self.selection.plane_order().to_vec(),
        }
    }

    fn save_snapshot_now(&mut self) {
        let snap = self.current_snapshot();
        if let Some(store) = self.store.as_mut() {
            snap.save(&mut **store);
            debug!("snapshot saved");
        }
    }

    fn restore_from_store(&mut self) {
        let Some(snap) = self
            .store
            .as_ref()
            .and_then(|s| LatticeSnapshot::load(&**s))
        else {
            return;
        };
        info!(
            selected = snap.selected_plane.len(),
            primes = snap.visible_primes.len(),
            "restoring lattice state"
        );
        self.camera = Camera::new(snap.camera.center, snap.camera.scale);
        self.selection.set_pivot(snap.pivot);
        self.visible_primes = snap.visible_primes.iter().copied().collect();
        let shifts: BTreeMap<u32, i32> = snap.axis_shift.iter().copied().collect();
        self.selection.restore_shifts(&shifts);
        self.settings.label_mode = snap.label_mode;
        self.settings.guides = snap.guides;
        self.settings.audition_enabled = snap.audition_enabled;
        self.selection.restore_plane(&snap.selected_plane);
        self.selection.normalize();
        self.resync_now(false, "restore");
        self.notify_selection_changed();
    }

    // --- queries for the view layer and tests ---

    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn sounding_count(&self) -> usize {
        self.voices.sounding_count()
    }

    pub fn is_voice_bound(&self, key: SelectionKey) -> bool {
        self.voices.is_bound(key)
    }

    pub fn is_voice_paused(&self, key: SelectionKey) -> bool {
        self.voices.is_paused(key)
    }
}

fn preview_owner_key(key: SelectionKey) -> String {
    format!("{}:preview", key.owner_key())
}
