mod common;

use common::{ToneCall, engine, settle};
use tonnetz::core::coord::{LatticeCoord, SelectionKey};
use tonnetz::engine::settings::SettingsEvent;

#[test]
fn selecting_unison_sustains_root_once_and_stop_once() {
    let (mut eng, clock, tone) = engine();
    let origin = LatticeCoord::new(0, 0);

    eng.toggle_selection(origin);
    settle(&mut eng, &clock);

    let sustains = tone.sustains_for("plane:0:0");
    assert_eq!(sustains.len(), 1, "exactly one sustain call");
    assert!(
        (sustains[0] - 261.625_55).abs() < 1e-2,
        "1/1 node sounds at the root frequency, got {}",
        sustains[0]
    );
    assert!(eng.is_voice_bound(SelectionKey::Plane(origin)));

    tone.clear();
    eng.toggle_selection(origin);
    settle(&mut eng, &clock);

    assert_eq!(tone.stops_for("plane:0:0"), 1, "exactly one stop call");
    assert_eq!(tone.sustain_count(), 0);
    assert_eq!(eng.sounding_count(), 0);
}

#[test]
fn fifth_node_sounds_three_halves_of_root() {
    let (mut eng, clock, tone) = engine();
    eng.toggle_selection(LatticeCoord::new(1, 0));
    settle(&mut eng, &clock);

    let sustains = tone.sustains_for("plane:1:0");
    assert_eq!(sustains.len(), 1);
    let expected = 261.625_55_f32 * 1.5;
    assert!((sustains[0] - expected).abs() < 1e-2);
}

#[test]
fn disabling_audition_hard_stops_all_voices() {
    let (mut eng, clock, tone) = engine();
    eng.toggle_selection(LatticeCoord::new(0, 0));
    eng.toggle_selection(LatticeCoord::new(1, 0));
    settle(&mut eng, &clock);
    assert_eq!(eng.sounding_count(), 2);

    tone.clear();
    let tx = eng.settings_sender();
    tx.send(SettingsEvent::AuditionEnabled(false)).unwrap();
    eng.tick();

    assert_eq!(eng.sounding_count(), 0);
    assert_eq!(tone.stop_count(), 2);
    assert!(
        tone.calls().contains(&ToneCall::StopAll),
        "disable flips go through a hard rebuild so no orphan survives"
    );

    // re-enable restores the full selection
    tone.clear();
    tx.send(SettingsEvent::AuditionEnabled(true)).unwrap();
    eng.tick();
    assert_eq!(tone.sustain_count(), 2);
    assert_eq!(eng.sounding_count(), 2);
}

#[test]
fn lattice_sound_toggle_also_gates_voices() {
    let (mut eng, clock, tone) = engine();
    let tx = eng.settings_sender();
    tx.send(SettingsEvent::LatticeSoundEnabled(false)).unwrap();
    eng.tick();

    eng.toggle_selection(LatticeCoord::new(0, 0));
    settle(&mut eng, &clock);
    assert_eq!(tone.sustain_count(), 0, "muted lattice never starts voices");
    assert_eq!(eng.selected_count(), 1, "selection itself is unaffected");
}

#[test]
fn selection_changed_stream_reports_counts() {
    let (mut eng, _clock, _tone) = engine();
    let rx = eng.subscribe_selection();
    eng.toggle_selection(LatticeCoord::new(0, 0));
    eng.toggle_selection(LatticeCoord::new(1, 0));
    eng.clear_selection();

    let counts: Vec<usize> = rx.try_iter().map(|c| c.selected_count).collect();
    assert_eq!(counts.first(), Some(&1));
    assert_eq!(counts.last(), Some(&0));
}
