//! Motive detection
//!
//! Segments the note stream into 1-2 beat motives opened at strong beats and
//! classifies each motive's relationship to its predecessor (repetition,
//! sequence, variation, fragmentation, inversion, or new material).

use crate::models::note::Note;
use crate::models::score::TimeSignature;
use crate::models::structure::{Motive, MotiveRelationship};
use crate::analysis::similarity::{
    contour, detect_transposition, interval_pattern, interval_similarity, is_fragmentation,
    is_inversion, rhythm_pattern, rhythm_similarity,
};

/// Strong beats of a measure: the downbeat, plus beat 2 in 4-beat meters
fn strong_beats(time_signature: &TimeSignature) -> Vec<f64> {
    if time_signature.beats == 4 {
        vec![0.0, 2.0]
    } else {
        vec![0.0]
    }
}

/// A motive candidate before relationship classification
pub type MotiveGroup = (u32, f64, Vec<Note>);

/// Collect motive candidates over a note slice
///
/// Notes are grouped per measure; a candidate opens at each strong beat and
/// runs until the next strong beat or the end of the measure. Candidates
/// with fewer than two notes are discarded. Grouping is purely local, so
/// the chunked driver can collect per window and classify globally.
pub fn collect_motive_groups(notes: &[Note], time_signature: &TimeSignature) -> Vec<MotiveGroup> {
    let strong = strong_beats(time_signature);
    let mut raw: Vec<MotiveGroup> = Vec::new();

    let mut measure_numbers: Vec<u32> = notes.iter().map(|n| n.measure).collect();
    measure_numbers.dedup();

    for &measure in &measure_numbers {
        let in_measure: Vec<&Note> = notes.iter().filter(|n| n.measure == measure).collect();
        if in_measure.is_empty() {
            continue;
        }
        for (i, &start) in strong.iter().enumerate() {
            let end = strong.get(i + 1).copied().unwrap_or(f64::INFINITY);
            let group: Vec<Note> = in_measure
                .iter()
                .filter(|n| n.beat >= start && n.beat < end)
                .map(|n| (*n).clone())
                .collect();
            if group.len() >= 2 {
                let start_beat = group[0].beat;
                raw.push((measure, start_beat, group));
            }
        }
    }
    raw
}

/// Detect motives over a note slice
pub fn detect_motives(notes: &[Note], time_signature: &TimeSignature) -> Vec<Motive> {
    classify_motive_groups(collect_motive_groups(notes, time_signature))
}

/// Classify collected candidates into motives with relationships
pub fn classify_motive_groups(raw: Vec<MotiveGroup>) -> Vec<Motive> {
    let mut motives: Vec<Motive> = Vec::with_capacity(raw.len());
    for (index, (measure, start_beat, group)) in raw.into_iter().enumerate() {
        let intervals = interval_pattern(&group);
        let rhythm = rhythm_pattern(&group);
        let motive_contour = contour(&group);
        let (relationship, confidence, related_to) = if index == 0 {
            (MotiveRelationship::New, 0.6, None)
        } else {
            let prev = &motives[index - 1];
            let (rel, conf) = classify_relationship(prev, &group, &intervals, &rhythm);
            let related = if matches!(rel, MotiveRelationship::New) { None } else { Some(index - 1) };
            (rel, conf, related)
        };
        motives.push(Motive {
            index,
            measure,
            start_beat,
            notes: group,
            interval_pattern: intervals,
            rhythm_pattern: rhythm,
            contour: motive_contour,
            relationship,
            relationship_confidence: confidence,
            related_to,
        });
    }
    motives
}

/// Classify how a motive relates to its predecessor, first matching rule wins
fn classify_relationship(
    prev: &Motive,
    notes: &[Note],
    intervals: &[i32],
    rhythm: &[f64],
) -> (MotiveRelationship, f64) {
    let interval_sim = interval_similarity(&prev.interval_pattern, intervals);
    let rhythm_sim = rhythm_similarity(&prev.rhythm_pattern, rhythm);

    if interval_sim > 0.9 && rhythm_sim > 0.9 {
        return (MotiveRelationship::Repetition, 0.95);
    }
    let transposition = detect_transposition(&prev.notes, notes);
    if interval_sim > 0.8 && rhythm_sim > 0.7 && transposition != 0 {
        return (MotiveRelationship::Sequence { transposition }, 0.85);
    }
    if rhythm_sim > 0.8 && interval_sim < 0.5 {
        return (MotiveRelationship::Variation, 0.7);
    }
    if is_fragmentation(&prev.interval_pattern, intervals) {
        return (MotiveRelationship::Fragmentation, 0.75);
    }
    if is_inversion(&prev.interval_pattern, intervals) {
        return (MotiveRelationship::Inversion, 0.8);
    }
    (MotiveRelationship::New, 0.6)
}
