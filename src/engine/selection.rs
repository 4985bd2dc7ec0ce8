// src/engine/selection.rs
//
// Single owner of selection membership, insertion order, per-node octave
// offsets, axis shifts, the pivot, and the undo/redo log. Mutations are
// reported as `Change` values so the engine can drive animation and
// audio without this module knowing either exists.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::core::coord::{GhostMonzo, LatticeCoord, SelectionKey};

pub const AXIS_SHIFT_MIN: i32 = -5;
pub const AXIS_SHIFT_MAX: i32 = 5;

/// Undoable actions. `ToggleNode` is its own inverse; `Shift` inverts by
/// negating the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift { prime: u32, delta: i32 },
    ToggleNode(SelectionKey),
}

/// What a mutating call actually did, for the engine to translate into
/// animation and voice side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Toggled { key: SelectionKey, now_on: bool },
    Shifted { prime: u32, shift: i32 },
}

#[derive(Debug)]
pub struct SelectionState {
    plane: BTreeSet<LatticeCoord>,
    plane_order: Vec<LatticeCoord>,
    ghost: BTreeSet<GhostMonzo>,
    ghost_order: Vec<GhostMonzo>,
    order_keys: Vec<SelectionKey>,
    octave_plane: BTreeMap<LatticeCoord, i32>,
    octave_ghost: BTreeMap<GhostMonzo, i32>,
    axis_shift: BTreeMap<u32, i32>,
    pivot: LatticeCoord,
    undo_log: Vec<Action>,
    redo_log: Vec<Action>,
    undo_cap: usize,
    baseline: Option<BTreeSet<SelectionKey>>,
}

impl SelectionState {
    pub fn new(undo_cap: usize) -> Self {
        Self {
            plane: BTreeSet::new(),
            plane_order: Vec::new(),
            ghost: BTreeSet::new(),
            ghost_order: Vec::new(),
            order_keys: Vec::new(),
            octave_plane: BTreeMap::new(),
            octave_ghost: BTreeMap::new(),
            axis_shift: BTreeMap::new(),
            pivot: LatticeCoord::ORIGIN,
            undo_log: Vec::new(),
            redo_log: Vec::new(),
            undo_cap: undo_cap.max(1),
            baseline: None,
        }
    }

    // --- membership ---

    pub fn toggle_plane(&mut self, coord: LatticeCoord) -> Change {
        let change = self.apply_toggle(SelectionKey::Plane(coord));
        self.record(Action::ToggleNode(SelectionKey::Plane(coord)));
        change
    }

    pub fn toggle_ghost(&mut self, ghost: GhostMonzo) -> Change {
        let change = self.apply_toggle(SelectionKey::Ghost(ghost));
        self.record(Action::ToggleNode(SelectionKey::Ghost(ghost)));
        change
    }

    fn apply_toggle(&mut self, key: SelectionKey) -> Change {
        let now_on = match key {
            SelectionKey::Plane(c) => {
                if self.plane.remove(&c) {
                    self.plane_order.retain(|x| *x != c);
                    self.octave_plane.remove(&c);
                    false
                } else {
                    self.plane.insert(c);
                    self.plane_order.push(c);
                    true
                }
            }
            SelectionKey::Ghost(g) => {
                if self.ghost.remove(&g) {
                    self.ghost_order.retain(|x| *x != g);
                    self.octave_ghost.remove(&g);
                    false
                } else {
                    self.ghost.insert(g);
                    self.ghost_order.push(g);
                    true
                }
            }
        };
        if now_on {
            self.order_keys.push(key);
        } else {
            self.order_keys.retain(|k| *k != key);
        }
        Change::Toggled { key, now_on }
    }

    /// Toggle every selected node off as one batch.
    pub fn clear(&mut self) -> Vec<Change> {
        let keys: Vec<SelectionKey> = self.order_keys.clone();
        let mut changes = Vec::with_capacity(keys.len());
        for key in keys {
            changes.push(self.apply_toggle(key));
            self.record(Action::ToggleNode(key));
        }
        changes
    }

    // --- axis shift / pivot ---

    /// Shift a prime axis, clamped to the allowed range. Only the delta
    /// that actually applied is recorded, so undo restores exactly.
    pub fn shift(&mut self, prime: u32, delta: i32) -> Option<Change> {
        let applied = self.apply_shift(prime, delta)?;
        self.record(Action::Shift {
            prime,
            delta: applied,
        });
        Some(Change::Shifted {
            prime,
            shift: self.axis_shift(prime),
        })
    }

    fn apply_shift(&mut self, prime: u32, delta: i32) -> Option<i32> {
        let current = self.axis_shift(prime);
        let next = (current + delta).clamp(AXIS_SHIFT_MIN, AXIS_SHIFT_MAX);
        if next == current {
            return None;
        }
        if next == 0 {
            self.axis_shift.remove(&prime);
        } else {
            self.axis_shift.insert(prime, next);
        }
        Some(next - current)
    }

    /// Reset one prime's shift, or all of them. Each changed prime is
    /// recorded as its own undoable shift.
    pub fn reset_shift(&mut self, prime: Option<u32>) -> Vec<Change> {
        let primes: Vec<u32> = match prime {
            Some(p) => vec![p],
            None => self.axis_shift.keys().copied().collect(),
        };
        let mut changes = Vec::new();
        for p in primes {
            let cur = self.axis_shift(p);
            if cur != 0
                && let Some(change) = self.shift(p, -cur)
            {
                changes.push(change);
            }
        }
        changes
    }

    pub fn axis_shift(&self, prime: u32) -> i32 {
        self.axis_shift.get(&prime).copied().unwrap_or(0)
    }

    pub fn axis_shifts(&self) -> &BTreeMap<u32, i32> {
        &self.axis_shift
    }

    pub fn set_pivot(&mut self, pivot: LatticeCoord) {
        self.pivot = pivot;
    }

    pub fn pivot(&self) -> LatticeCoord {
        self.pivot
    }

    // --- octave offsets ---

    /// Set a node's octave offset. Ignored unless the node is selected.
    pub fn set_octave_offset(&mut self, key: SelectionKey, offset: i32) -> bool {
        match key {
            SelectionKey::Plane(c) => {
                if !self.plane.contains(&c) {
                    return false;
                }
                if offset == 0 {
                    self.octave_plane.remove(&c);
                } else {
                    self.octave_plane.insert(c, offset);
                }
            }
            SelectionKey::Ghost(g) => {
                if !self.ghost.contains(&g) {
                    return false;
                }
                if offset == 0 {
                    self.octave_ghost.remove(&g);
                } else {
                    self.octave_ghost.insert(g, offset);
                }
            }
        }
        true
    }

    pub fn octave_offset(&self, key: SelectionKey) -> i32 {
        match key {
            SelectionKey::Plane(c) => self.octave_plane.get(&c).copied().unwrap_or(0),
            SelectionKey::Ghost(g) => self.octave_ghost.get(&g).copied().unwrap_or(0),
        }
    }

    // --- undo/redo ---

    fn record(&mut self, action: Action) {
        self.redo_log.clear();
        self.undo_log.push(action);
        if self.undo_log.len() > self.undo_cap {
            let overflow = self.undo_log.len() - self.undo_cap;
            self.undo_log.drain(..overflow);
        }
    }

    /// Undo the most recent action. Applies the inverse without logging,
    /// then moves the action to the redo stack.
    pub fn undo(&mut self) -> Option<Change> {
        let action = self.undo_log.pop()?;
        let change = match action {
            Action::ToggleNode(key) => self.apply_toggle(key),
            Action::Shift { prime, delta } => {
                self.apply_shift(prime, -delta);
                Change::Shifted {
                    prime,
                    shift: self.axis_shift(prime),
                }
            }
        };
        self.redo_log.push(action);
        Some(change)
    }

    pub fn redo(&mut self) -> Option<Change> {
        let action = self.redo_log.pop()?;
        let change = match action {
            Action::ToggleNode(key) => self.apply_toggle(key),
            Action::Shift { prime, delta } => {
                self.apply_shift(prime, delta);
                Change::Shifted {
                    prime,
                    shift: self.axis_shift(prime),
                }
            }
        };
        self.undo_log.push(action);
        Some(change)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_log.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_log.len()
    }

    // --- staging baseline ---

    /// Capture the current selection as the baseline for the pending-
    /// changes badge.
    pub fn begin_staging(&mut self) {
        self.baseline = Some(self.order_keys.iter().copied().collect());
    }

    /// Nodes selected now that were not in the captured baseline.
    pub fn additions_since_baseline(&self) -> usize {
        match &self.baseline {
            Some(base) => self
                .order_keys
                .iter()
                .filter(|k| !base.contains(k))
                .count(),
            None => self.order_keys.len(),
        }
    }

    // --- queries ---

    pub fn selected_count(&self) -> usize {
        self.plane.len() + self.ghost.len()
    }

    pub fn selected_plane(&self) -> &BTreeSet<LatticeCoord> {
        &self.plane
    }

    pub fn selected_ghost(&self) -> &BTreeSet<GhostMonzo> {
        &self.ghost
    }

    pub fn plane_order(&self) -> &[LatticeCoord] {
        &self.plane_order
    }

    pub fn ghost_order(&self) -> &[GhostMonzo] {
        &self.ghost_order
    }

    /// Global chronological order across both families.
    pub fn order_keys(&self) -> &[SelectionKey] {
        &self.order_keys
    }

    pub fn is_selected(&self, key: SelectionKey) -> bool {
        match key {
            SelectionKey::Plane(c) => self.plane.contains(&c),
            SelectionKey::Ghost(g) => self.ghost.contains(&g),
        }
    }

    /// Restore bulk state from a snapshot: selection replaced wholesale,
    /// no animation, no undo history.
    pub fn restore_plane(&mut self, order: &[LatticeCoord]) {
        self.plane.clear();
        self.plane_order.clear();
        self.order_keys.retain(|k| !matches!(k, SelectionKey::Plane(_)));
        for &c in order {
            if self.plane.insert(c) {
                self.plane_order.push(c);
                self.order_keys.push(SelectionKey::Plane(c));
            }
        }
    }

    pub fn restore_shifts(&mut self, shifts: &BTreeMap<u32, i32>) {
        self.axis_shift.clear();
        for (&p, &s) in shifts {
            let clamped = s.clamp(AXIS_SHIFT_MIN, AXIS_SHIFT_MAX);
            if clamped != 0 {
                self.axis_shift.insert(p, clamped);
            }
        }
    }

    /// Repair any drift between sets and order lists: drop stale order
    /// entries, then append missing members in sorted order. Called
    /// defensively after batch mutations; a repair is a logic bug being
    /// papered over, so it logs.
    pub fn normalize(&mut self) -> bool {
        let mut repaired = false;

        let plane = &self.plane;
        let before = self.plane_order.len();
        let mut seen: BTreeSet<LatticeCoord> = BTreeSet::new();
        self.plane_order.retain(|c| plane.contains(c) && seen.insert(*c));
        repaired |= self.plane_order.len() != before;
        for &c in self.plane.iter() {
            if !seen.contains(&c) {
                self.plane_order.push(c);
                repaired = true;
            }
        }

        let ghost = &self.ghost;
        let before = self.ghost_order.len();
        let mut seen_g: BTreeSet<GhostMonzo> = BTreeSet::new();
        self.ghost_order.retain(|g| ghost.contains(g) && seen_g.insert(*g));
        repaired |= self.ghost_order.len() != before;
        for &g in self.ghost.iter() {
            if !seen_g.contains(&g) {
                self.ghost_order.push(g);
                repaired = true;
            }
        }

        let before = self.order_keys.len();
        let mut seen_k: BTreeSet<SelectionKey> = BTreeSet::new();
        let plane = &self.plane;
        let ghost = &self.ghost;
        self.order_keys.retain(|k| {
            let member = match k {
                SelectionKey::Plane(c) => plane.contains(c),
                SelectionKey::Ghost(g) => ghost.contains(g),
            };
            member && seen_k.insert(*k)
        });
        repaired |= self.order_keys.len() != before;
        if self.order_keys.len() != self.selected_count() {
            // stable merge of the per-family orders
            self.order_keys.clear();
            self.order_keys
                .extend(self.plane_order.iter().map(|&c| SelectionKey::Plane(c)));
            self.order_keys
                .extend(self.ghost_order.iter().map(|&g| SelectionKey::Ghost(g)));
            repaired = true;
        }

        if repaired {
            warn!(
                plane = self.plane.len(),
                ghost = self.ghost.len(),
                "selection order drifted; normalized"
            );
        }
        repaired
    }

    /// Order/set consistency, checked by tests after every mutation.
    pub fn invariant_holds(&self) -> bool {
        let plane_set: BTreeSet<LatticeCoord> = self.plane_order.iter().copied().collect();
        let ghost_set: BTreeSet<GhostMonzo> = self.ghost_order.iter().copied().collect();
        plane_set == self.plane
            && ghost_set == self.ghost
            && self.plane_order.len() == self.plane.len()
            && self.ghost_order.len() == self.ghost.len()
            && self.order_keys.len() == self.selected_count()
    }
}
