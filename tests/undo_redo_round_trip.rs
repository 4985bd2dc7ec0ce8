mod common;

use common::{engine, settle};
use tonnetz::core::coord::{LatticeCoord, SelectionKey};

#[test]
fn shift_then_undo_restores_and_arms_redo() {
    let (mut eng, _clock, _tone) = engine();
    assert_eq!(eng.selection().axis_shift(3), 0);

    eng.shift(3, 1);
    assert_eq!(eng.selection().axis_shift(3), 1);

    eng.undo();
    assert_eq!(eng.selection().axis_shift(3), 0);
    assert_eq!(eng.selection().redo_depth(), 1);

    eng.redo();
    assert_eq!(eng.selection().axis_shift(3), 1);
}

#[test]
fn toggle_undo_redo_matches_plain_apply() {
    let (mut eng, clock, _tone) = engine();
    let c = LatticeCoord::new(2, -1);

    eng.toggle_selection(c);
    settle(&mut eng, &clock);
    let order_after_apply = eng.selection().plane_order().to_vec();
    let sounding_after_apply = eng.sounding_count();

    eng.undo();
    settle(&mut eng, &clock);
    assert_eq!(eng.selected_count(), 0);
    assert_eq!(eng.sounding_count(), 0, "undo releases the voice too");

    eng.redo();
    settle(&mut eng, &clock);
    assert_eq!(eng.selection().plane_order(), order_after_apply.as_slice());
    assert_eq!(eng.sounding_count(), sounding_after_apply);
    assert!(eng.selection().invariant_holds());
}

#[test]
fn shift_undo_retunes_sounding_voice() {
    let (mut eng, clock, tone) = engine();
    eng.toggle_selection(LatticeCoord::new(1, 0)); // 3/2
    settle(&mut eng, &clock);

    tone.clear();
    eng.shift(3, 1); // 9/8, still one voice
    let retuned = tone.retunes();
    assert_eq!(retuned.len(), 1, "shift retunes in place, no restart");
    let expected = 261.625_55_f32 * 9.0 / 8.0;
    assert!((retuned[0] - expected).abs() < 1e-2);
    assert_eq!(tone.sustain_count(), 0);

    tone.clear();
    eng.undo();
    let back = tone.retunes();
    assert_eq!(back.len(), 1);
    assert!((back[0] - 261.625_55 * 1.5).abs() < 1e-2);
}

#[test]
fn new_action_clears_redo_branch() {
    let (mut eng, _clock, _tone) = engine();
    eng.toggle_selection(LatticeCoord::new(0, 0));
    eng.undo();
    assert_eq!(eng.selection().redo_depth(), 1);
    eng.shift(5, -1);
    assert_eq!(eng.selection().redo_depth(), 0);
}

#[test]
fn octave_offset_survives_unrelated_undo() {
    let (mut eng, _clock, _tone) = engine();
    let c = LatticeCoord::new(0, 1);
    eng.toggle_selection(c);
    eng.set_octave_offset(SelectionKey::Plane(c), 1);
    eng.toggle_selection(LatticeCoord::new(1, 1));
    eng.undo(); // removes (1,1) only
    assert_eq!(eng.selection().octave_offset(SelectionKey::Plane(c)), 1);
}
