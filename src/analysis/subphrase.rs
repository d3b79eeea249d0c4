//! Sub-phrase detection
//!
//! Emits roughly one sub-phrase per measure, splitting busy measures at an
//! internal rhythmic break, and assigns material labels greedily against all
//! earlier sub-phrases.

use crate::models::note::Note;
use crate::models::score::TimeSignature;
use crate::models::structure::{Motive, SubPhrase};
use crate::analysis::similarity::melodic_similarity;

/// Similarity above which a sub-phrase counts as a varied restatement
const PRIME_THRESHOLD: f64 = 0.8;
/// Similarity above which a sub-phrase counts as a looser variant
const VARIANT_THRESHOLD: f64 = 0.5;

/// Whether a measure's notes contain an internal rhythmic break
///
/// A break is a note held for two beats or more, or a rest that is neither
/// the first nor the last event of the measure.
fn has_internal_break(notes: &[Note]) -> bool {
    notes.iter().any(|n| n.duration >= 2.0)
        || notes
            .iter()
            .enumerate()
            .any(|(i, n)| n.is_rest() && i > 0 && i + 1 < notes.len())
}

/// A sub-phrase segment before material labelling
pub type SubPhraseSegment = (u32, f64, f64, Vec<Note>);

/// Segment a note slice into sub-phrase spans
///
/// Measures with more than four notes and an internal break split at the
/// midpoint of the note list into halves covering beats [0, 2) and [2, 4);
/// every other measure yields a single segment. Segmentation is purely
/// local, so the chunked driver can segment per window and label globally.
pub fn segment_sub_phrases(
    notes: &[Note],
    time_signature: &TimeSignature,
) -> Vec<SubPhraseSegment> {
    let beats = f64::from(time_signature.beats);
    let mut measure_numbers: Vec<u32> = notes.iter().map(|n| n.measure).collect();
    measure_numbers.dedup();

    let mut segments: Vec<SubPhraseSegment> = Vec::new();
    for &measure in &measure_numbers {
        let in_measure: Vec<Note> =
            notes.iter().filter(|n| n.measure == measure).cloned().collect();
        if in_measure.is_empty() {
            continue;
        }
        if in_measure.len() > 4 && has_internal_break(&in_measure) {
            let midpoint = in_measure.len() / 2;
            let (front, back) = in_measure.split_at(midpoint);
            let half = beats / 2.0;
            segments.push((measure, 0.0, half, front.to_vec()));
            segments.push((measure, half, beats, back.to_vec()));
        } else {
            segments.push((measure, 0.0, beats, in_measure));
        }
    }
    segments
}

/// Detect sub-phrases over a note slice
pub fn detect_sub_phrases(
    notes: &[Note],
    time_signature: &TimeSignature,
    motives: &[Motive],
) -> Vec<SubPhrase> {
    label_segments(segment_sub_phrases(notes, time_signature), motives)
}

/// Label segments with materials and attach their motives
pub fn label_segments(
    segments: Vec<SubPhraseSegment>,
    motives: &[Motive],
) -> Vec<SubPhrase> {
    let mut sub_phrases: Vec<SubPhrase> = Vec::with_capacity(segments.len());
    let mut letters_used: u32 = 0;
    for (index, (measure, start_beat, end_beat, segment_notes)) in
        segments.into_iter().enumerate()
    {
        let (material, similar_to, similarity) =
            assign_material(&segment_notes, &sub_phrases, &mut letters_used);
        let segment_motives: Vec<Motive> = motives
            .iter()
            .filter(|m| {
                m.measure == measure && m.start_beat >= start_beat && m.start_beat < end_beat
            })
            .cloned()
            .collect();
        sub_phrases.push(SubPhrase {
            index,
            start_measure: measure,
            end_measure: measure,
            start_beat,
            end_beat,
            notes: segment_notes,
            motives: segment_motives,
            material,
            similar_to,
            similarity,
        });
    }
    sub_phrases
}

/// Greedy material labelling against all earlier sub-phrases
///
/// The best earlier match decides the label: a close match appends a prime,
/// a loose match appends `v`, anything else introduces the next letter.
fn assign_material(
    notes: &[Note],
    earlier: &[SubPhrase],
    letters_used: &mut u32,
) -> (String, Option<usize>, Option<f64>) {
    let mut best: Option<(usize, f64)> = None;
    for candidate in earlier {
        let score = melodic_similarity(&candidate.notes, notes);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate.index, score));
        }
    }
    match best {
        Some((index, score)) if score >= PRIME_THRESHOLD => {
            let material = format!("{}'", earlier[index].material);
            (material, Some(index), Some(score))
        }
        Some((index, score)) if score >= VARIANT_THRESHOLD => {
            let material = format!("{}v", earlier[index].material);
            (material, Some(index), Some(score))
        }
        _ => {
            let letter = next_letter(*letters_used);
            *letters_used += 1;
            (letter.to_string(), None, None)
        }
    }
}

/// The nth fresh material letter (a, b, c, ...)
pub(crate) fn next_letter(count: u32) -> char {
    char::from_u32(u32::from(b'a') + count.min(25)).unwrap_or('z')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{PitchName, Step};

    fn note(step: Step, octave: i32, duration: f64, measure: u32, beat: f64) -> Note {
        Note::pitched(PitchName::natural(step, octave), duration, measure, beat, 0)
    }

    #[test]
    fn one_sub_phrase_per_plain_measure() {
        let ts = TimeSignature::default();
        let notes = vec![
            note(Step::C, 4, 1.0, 1, 0.0),
            note(Step::D, 4, 1.0, 1, 1.0),
            note(Step::E, 4, 2.0, 1, 2.0),
            note(Step::F, 4, 1.0, 2, 0.0),
        ];
        let subs = detect_sub_phrases(&notes, &ts, &[]);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].start_measure, 1);
        assert_eq!(subs[0].end_beat, 4.0);
    }

    #[test]
    fn busy_measure_with_long_note_splits_in_half() {
        let ts = TimeSignature::default();
        let notes = vec![
            note(Step::C, 4, 0.5, 1, 0.0),
            note(Step::D, 4, 0.5, 1, 0.5),
            note(Step::E, 4, 0.5, 1, 1.0),
            note(Step::F, 4, 2.0, 1, 1.5),
            note(Step::G, 4, 0.25, 1, 3.5),
            note(Step::A, 4, 0.25, 1, 3.75),
        ];
        let subs = detect_sub_phrases(&notes, &ts, &[]);
        assert_eq!(subs.len(), 2);
        assert_eq!((subs[0].start_beat, subs[0].end_beat), (0.0, 2.0));
        assert_eq!((subs[1].start_beat, subs[1].end_beat), (2.0, 4.0));
        assert_eq!(subs[0].notes.len(), 3);
        assert_eq!(subs[1].notes.len(), 3);
    }

    #[test]
    fn near_identical_measures_share_a_primed_label() {
        let ts = TimeSignature::default();
        let mut notes = Vec::new();
        for measure in 1..=2 {
            notes.push(note(Step::C, 4, 1.0, measure, 0.0));
            notes.push(note(Step::E, 4, 1.0, measure, 1.0));
            notes.push(note(Step::G, 4, 2.0, measure, 2.0));
        }
        let subs = detect_sub_phrases(&notes, &ts, &[]);
        assert_eq!(subs[0].material, "a");
        assert_eq!(subs[1].material, "a'");
        assert_eq!(subs[1].similar_to, Some(0));
    }

    #[test]
    fn contrasting_measures_get_fresh_letters() {
        let ts = TimeSignature::default();
        let notes = vec![
            note(Step::C, 4, 1.0, 1, 0.0),
            note(Step::D, 4, 1.0, 1, 1.0),
            Note::pitched(PitchName::natural(Step::B, 5), 0.25, 2, 0.0, 0),
            Note::pitched(PitchName::natural(Step::C, 3), 0.25, 2, 0.25, 0),
        ];
        let subs = detect_sub_phrases(&notes, &ts, &[]);
        assert_eq!(subs[0].material, "a");
        assert_eq!(subs[1].material, "b");
    }
}
