mod common;

use common::engine;
use tonnetz::core::coord::{LatticeCoord, SelectionKey};

#[test]
fn ring_phase_expires_after_duration_plus_slack() {
    let (mut eng, clock, _tone) = engine();
    let key = SelectionKey::Plane(LatticeCoord::new(0, 0));

    eng.toggle_selection(LatticeCoord::new(0, 0));
    let phase = eng.ring_phase(key).expect("fresh phase");
    assert_eq!(phase.progress, 0.0);
    assert!(phase.target_on);

    clock.advance(0.11); // halfway through the 0.22 s attack
    let phase = eng.ring_phase(key).expect("mid phase");
    assert!((phase.progress - 0.5).abs() < 0.05);

    clock.advance(0.22); // past duration + slack
    eng.tick();
    assert!(eng.ring_phase(key).is_none(), "phase self-expires");
}

#[test]
fn retoggle_restarts_phase_without_stacking() {
    let (mut eng, clock, _tone) = engine();
    let c = LatticeCoord::new(1, 0);
    let key = SelectionKey::Plane(c);

    eng.toggle_selection(c);
    clock.advance(0.1);
    eng.tick();
    eng.toggle_selection(c); // off, mid-animation

    let phase = eng.ring_phase(key).expect("restarted phase");
    assert_eq!(phase.progress, 0.0, "fresh entry, not the stale one");
    assert!(!phase.target_on);
}

#[test]
fn jitter_seed_is_reproducible_across_engines() {
    let (mut a, _ca, _ta) = engine();
    let (mut b, _cb, _tb) = engine();
    let c = LatticeCoord::new(3, -2);
    a.toggle_selection(c);
    b.toggle_selection(c);
    let key = SelectionKey::Plane(c);
    let pa = a.ring_phase(key).expect("phase a");
    let pb = b.ring_phase(key).expect("phase b");
    assert_eq!(pa.seed, pb.seed, "same node, same jitter, any run");
}
