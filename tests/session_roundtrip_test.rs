// Session export / import round trip

use std::fs;
use std::io::Write;

use scoremap::mapping::preference::UserAction;
use scoremap::models::{
    KeySignature, Measure, Note, ParsedScore, PitchName, TimeSignature,
};
use scoremap::tree::StructureType;
use scoremap::Session;

fn make_measures(count: u32) -> Vec<Measure> {
    (1..=count).map(|number| Measure { number }).collect()
}

fn melody_note(pitch: &str, duration: f64, measure: u32, beat: f64, voice: u32) -> Note {
    Note::pitched(pitch.parse::<PitchName>().expect("pitch"), duration, measure, beat, voice)
}

/// Eight measures closing V-I twice, enough to produce a real tree
fn make_score() -> ParsedScore {
    let melody = ["C5", "E5", "D5", "C5", "C5", "E5", "G5", "C5"];
    let bass = ["C3", "F3", "G3", "C3", "C3", "F3", "G3", "C3"];
    let mut notes = Vec::new();
    for measure in 1..=8u32 {
        notes.push(melody_note(melody[measure as usize - 1], 2.0, measure, 0.0, 0));
        notes.push(melody_note(melody[measure as usize - 1], 2.0, measure, 2.0, 0));
        notes.push(melody_note(bass[measure as usize - 1], 4.0, measure, 0.0, 1));
    }
    notes.sort_by(|a, b| {
        a.measure
            .cmp(&b.measure)
            .then(a.beat.partial_cmp(&b.beat).expect("finite beats"))
            .then(a.voice.cmp(&b.voice))
    });
    ParsedScore::new(
        make_measures(8),
        notes,
        KeySignature::default(),
        TimeSignature::default(),
    )
}

fn analyzed_session() -> Session {
    let mut session = Session::with_seed(make_score(), 7).expect("session");
    session.analyze().expect("analysis");
    session
}

#[test]
fn export_import_export_is_stable() {
    let mut session = analyzed_session();

    // Leave user traces in the state: a recommendation acted on and an edit
    let root_id = session.node_at_measure(1).expect("node at measure 1").to_string();
    let schemes = session.recommend(&root_id, 5);
    assert!(!schemes.is_empty());
    session.record_action(&root_id, schemes[0].clone(), UserAction::Accept);
    assert!(session.update_material(&root_id, "b"));

    let exported = session.export_state();
    let imported = Session::import_state(exported.clone()).expect("import");
    let re_exported = imported.export_state();

    assert_eq!(exported, re_exported);
}

#[test]
fn import_restores_the_edited_tree() {
    let mut session = analyzed_session();
    let analysis = session.analysis().expect("analysis");
    let (phrase_id, old_confidence) = analysis
        .tree
        .iter()
        .find(|(_, n)| n.node_type == StructureType::Phrase)
        .map(|(_, n)| (n.id.clone(), n.confidence))
        .expect("phrase node");

    assert!(session.update_material(&phrase_id, "z"));
    let imported =
        Session::import_state(session.export_state()).expect("import");
    let analysis = imported.analysis().expect("imported analysis");
    let node_id = analysis.tree.find(&phrase_id).expect("edited node survives");
    let node = analysis.tree.get(node_id).expect("node");
    assert_eq!(node.material, "z");
    assert!(node.confidence < old_confidence);
}

#[test]
fn json_round_trip_through_a_file() {
    let mut session = analyzed_session();
    session.adjust_alignment(1, 0.0);
    let json = session.export_json().expect("export json");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(json.as_bytes()).expect("write");
    let read_back = fs::read_to_string(file.path()).expect("read");

    let imported = Session::import_json(&read_back).expect("import");
    assert_eq!(imported.id(), session.id());
    assert_eq!(imported.score(), session.score());
    let json_again = imported.export_json().expect("re-export");
    assert_eq!(json, json_again);
}

#[test]
fn import_relinks_parents_and_children_by_id() {
    let session = analyzed_session();
    let imported = Session::import_state(session.export_state()).expect("import");
    let tree = &imported.analysis().expect("analysis").tree;
    for (id, node) in tree.iter() {
        for &child in tree.children(id) {
            let child_node = tree.get(child).expect("child");
            assert_eq!(child_node.parent, Some(id));
        }
        if let Some(parent) = node.parent {
            assert!(tree.children(parent).contains(&id));
        }
    }
}

#[test]
fn reset_clears_session_state() {
    let mut session = analyzed_session();
    let root_id = session.node_at_measure(1).expect("node").to_string();
    let schemes = session.recommend(&root_id, 5);
    session.record_action(&root_id, schemes[0].clone(), UserAction::Accept);
    assert!(!session.learning_history().is_empty());

    session.reset();
    assert!(session.analysis().is_none());
    assert!(session.learning_history().is_empty());
    assert!(session.visual_mappings().is_empty());
}
