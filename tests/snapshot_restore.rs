mod common;

use common::{SharedStore, engine, settle};
use tonnetz::core::coord::LatticeCoord;
use tonnetz::core::layout::Vec2;
use tonnetz::engine::snapshot::SNAPSHOT_KEY;

#[test]
fn state_survives_a_relaunch() {
    let store = SharedStore::default();

    let (mut eng, clock, _tone) = engine();
    eng.attach_store(Box::new(store.clone()));
    eng.toggle_selection(LatticeCoord::new(0, 0));
    eng.toggle_selection(LatticeCoord::new(1, 0));
    eng.shift(3, 2);
    eng.set_prime_visible(7, true);
    eng.pan(Vec2::new(120.0, -40.0));
    settle(&mut eng, &clock);
    clock.advance(1.0); // past the snapshot debounce
    eng.tick();
    assert!(store.raw(SNAPSHOT_KEY).is_some(), "snapshot written");

    let camera_before = *eng.camera();
    let order_before = eng.selection().plane_order().to_vec();

    // relaunch: fresh engine, same store
    let (mut eng2, clock2, tone2) = engine();
    eng2.attach_store(Box::new(store.clone()));
    assert_eq!(eng2.selection().plane_order(), order_before.as_slice());
    assert_eq!(eng2.selection().axis_shift(3), 2);
    assert!(eng2.visible_primes().contains(&7));
    assert_eq!(*eng2.camera(), camera_before);

    // restore resyncs voices immediately for the restored selection
    settle(&mut eng2, &clock2);
    assert_eq!(tone2.sustain_count(), 2);
}

#[test]
fn corrupt_blob_leaves_defaults() {
    let store = SharedStore::default();
    store.poison(SNAPSHOT_KEY);

    let (mut eng, _clock, _tone) = engine();
    eng.attach_store(Box::new(store));
    assert_eq!(eng.selected_count(), 0);
    assert_eq!(eng.selection().pivot(), LatticeCoord::new(0, 0));
    assert_eq!(eng.selection().axis_shift(3), 0);
}

#[test]
fn missing_blob_is_fine() {
    let (mut eng, _clock, _tone) = engine();
    eng.attach_store(Box::new(SharedStore::default()));
    assert_eq!(eng.selected_count(), 0);
}

#[test]
fn snapshot_save_is_debounced() {
    let store = SharedStore::default();
    let (mut eng, clock, _tone) = engine();
    eng.attach_store(Box::new(store.clone()));

    eng.toggle_selection(LatticeCoord::new(0, 0));
    clock.advance(0.3); // before the 700 ms quiet period
    eng.tick();
    assert!(store.raw(SNAPSHOT_KEY).is_none(), "save waits out the debounce");

    eng.toggle_selection(LatticeCoord::new(1, 0)); // pushes the deadline
    clock.advance(0.5);
    eng.tick();
    assert!(store.raw(SNAPSHOT_KEY).is_none());

    clock.advance(0.3);
    eng.tick();
    assert!(store.raw(SNAPSHOT_KEY).is_some());
}
