// Full pipeline over a small parallel-period piece

use scoremap::analysis::{analyze_complete, FullAnalysis};
use scoremap::models::{
    CadenceType, Closure, KeySignature, Measure, Note, ParsedScore, PeriodType, PhraseRelationship,
    PitchName, Proportion, TimeSignature,
};
use scoremap::tree::StructureType;

fn make_measures(count: u32) -> Vec<Measure> {
    (1..=count).map(|number| Measure { number }).collect()
}

fn melody_note(pitch: &str, duration: f64, measure: u32, beat: f64) -> Note {
    Note::pitched(pitch.parse::<PitchName>().expect("pitch"), duration, measure, beat, 0)
}

fn bass_note(pitch: &str, measure: u32) -> Note {
    Note::pitched(pitch.parse::<PitchName>().expect("pitch"), 4.0, measure, 0.0, 1)
}

/// Two four-measure phrases: the second repeats the first two measures and
/// diverges in the last two, both closing on an authentic cadence.
fn parallel_period_score() -> ParsedScore {
    let mut notes = vec![
        // Phrase A, measures 1-4: antecedent closing V-I
        melody_note("C5", 2.0, 1, 0.0),
        bass_note("C3", 1),
        melody_note("D5", 2.0, 1, 2.0),
        melody_note("E5", 2.0, 2, 0.0),
        bass_note("F3", 2),
        melody_note("C5", 2.0, 2, 2.0),
        melody_note("D5", 2.0, 3, 0.0),
        bass_note("G3", 3),
        melody_note("B4", 2.0, 3, 2.0),
        melody_note("C5", 4.0, 4, 0.0),
        bass_note("C3", 4),
        // Phrase A', measures 5-8: same head, new tail
        melody_note("C5", 2.0, 5, 0.0),
        bass_note("C3", 5),
        melody_note("D5", 2.0, 5, 2.0),
        melody_note("E5", 2.0, 6, 0.0),
        bass_note("F3", 6),
        melody_note("C5", 2.0, 6, 2.0),
        melody_note("G5", 1.0, 7, 0.0),
        bass_note("G3", 7),
        melody_note("F5", 1.0, 7, 1.0),
        melody_note("E5", 1.0, 7, 2.0),
        melody_note("D5", 1.0, 7, 3.0),
        melody_note("C5", 4.0, 8, 0.0),
        bass_note("C3", 8),
    ];
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

fn analyzed() -> FullAnalysis {
    analyze_complete(&parallel_period_score()).expect("analysis succeeds")
}

#[test]
fn parallel_period_is_detected() {
    let analysis = analyzed();
    assert_eq!(analysis.cadences.len(), 2);
    assert_eq!(analysis.cadences[0].measure, 4);
    assert_eq!(analysis.cadences[1].measure, 8);
    assert_eq!(analysis.cadences[1].cadence_type, CadenceType::PerfectAuthentic);

    assert_eq!(analysis.phrases.len(), 2);
    assert_eq!(analysis.phrases[0].material, "a");
    assert_eq!(analysis.phrases[1].material, "a'");
    assert_eq!(
        analysis.phrases[1].relationship,
        Some(PhraseRelationship::Parallel)
    );

    assert_eq!(analysis.periods.len(), 1);
    let period = &analysis.periods[0];
    assert_eq!(period.period_type, PeriodType::Parallel);
    assert_eq!(period.proportion, Proportion::Square);
    assert_eq!(period.closure, Closure::Closed);
}

#[test]
fn phrase_lengths_and_closure_satisfy_the_contract() {
    let analysis = analyzed();
    for phrase in &analysis.phrases {
        assert!(phrase.length() >= 2 && phrase.length() <= 12);
        let strength = phrase
            .cadence
            .as_ref()
            .map_or(0.3, |c| c.cadence_type.strength());
        let expected = if strength > 0.7 { Closure::Closed } else { Closure::Open };
        assert_eq!(phrase.closure, expected);
    }
}

#[test]
fn analysis_is_deterministic() {
    let first = analyzed();
    let second = analyzed();
    assert_eq!(first.phrases, second.phrases);
    assert_eq!(first.periods, second.periods);
    assert_eq!(first.cadences, second.cadences);
    assert_eq!(first.form, second.form);
    assert_eq!(first.tree, second.tree);
    for (a, b) in first
        .tree
        .iter()
        .map(|(_, n)| n)
        .zip(second.tree.iter().map(|(_, n)| n))
    {
        assert!((a.confidence - b.confidence).abs() < 1e-9);
        assert_eq!(a.material, b.material);
    }
}

#[test]
fn tree_ranges_are_consistent() {
    let analysis = analyzed();
    let tree = &analysis.tree;
    for (id, node) in tree.iter() {
        assert!(node.start_measure <= node.end_measure);
        let children = tree.children(id);
        for &child in children {
            let child_node = tree.get(child).expect("child exists");
            assert!(child_node.start_measure >= node.start_measure);
            assert!(child_node.end_measure <= node.end_measure);
            assert_eq!(child_node.parent, Some(id));
        }
        // Sibling spans never overlap
        for pair in children.windows(2) {
            let left = tree.get(pair[0]).expect("left child");
            let right = tree.get(pair[1]).expect("right child");
            assert!(
                left.end_measure < right.start_measure,
                "sibling spans overlap: {}..{} vs {}..{}",
                left.start_measure,
                left.end_measure,
                right.start_measure,
                right.end_measure
            );
        }
    }
}

#[test]
fn tree_carries_phrase_and_period_levels() {
    let analysis = analyzed();
    let types: Vec<StructureType> =
        analysis.tree.iter().map(|(_, n)| n.node_type).collect();
    assert!(types.contains(&StructureType::Section));
    assert!(types.contains(&StructureType::Theme));
    assert!(types.contains(&StructureType::Period));
    assert!(types.contains(&StructureType::Phrase));
    assert!(types.contains(&StructureType::SubPhrase));
    assert!(types.contains(&StructureType::Motive));
}

#[test]
fn statistics_summarise_the_score() {
    let analysis = analyzed();
    assert_eq!(analysis.statistics.measure_count, 8);
    assert_eq!(analysis.statistics.note_count, 24);
    assert!((analysis.statistics.mean_phrase_length - 4.0).abs() < 1e-9);
    let (low, high) = analysis.statistics.midi_range.expect("pitched notes");
    assert!(low < high);
}

#[test]
fn busy_measure_with_internal_rest_splits_into_two_sub_phrases() {
    use scoremap::analysis::subphrase::detect_sub_phrases;

    // Six eighth notes around a rest in the middle of the measure
    let notes = vec![
        melody_note("C5", 0.5, 1, 0.0),
        melody_note("D5", 0.5, 1, 0.5),
        melody_note("E5", 0.5, 1, 1.0),
        Note::rest(0.5, 1, 1.5, 0),
        melody_note("B3", 0.5, 1, 2.0),
        melody_note("G5", 0.5, 1, 2.5),
        melody_note("C4", 0.5, 1, 3.0),
    ];
    let subs = detect_sub_phrases(&notes, &TimeSignature::default(), &[]);
    assert_eq!(subs.len(), 2);
    assert_eq!((subs[0].start_beat, subs[0].end_beat), (0.0, 2.0));
    assert_eq!((subs[1].start_beat, subs[1].end_beat), (2.0, 4.0));
    assert_ne!(subs[0].material, subs[1].material);
}
