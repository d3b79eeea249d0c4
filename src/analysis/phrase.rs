//! Phrase detection
//!
//! Segments the piece on cadences into 2-12 measure phrases, splits overlong
//! spans, and assigns material labels and relationships from head/tail
//! similarity.

use crate::models::note::Note;
use crate::models::structure::{
    cadence_strength, Cadence, Closure, Phrase, PhraseRelationship, SubPhrase,
};
use crate::analysis::similarity::melodic_similarity;
use crate::analysis::subphrase::next_letter;

/// Minimum phrase length in measures
pub const MIN_PHRASE_MEASURES: u32 = 2;
/// Maximum phrase length in measures
pub const MAX_PHRASE_MEASURES: u32 = 12;
/// Head/tail comparison window in notes
const HEAD_CAP: usize = 8;

/// Detect phrases from sorted notes and cadences
///
/// A phrase opens at the first uncovered measure and closes at each cadence.
/// Spans longer than twelve measures split at the midpoint, the first half
/// left open; a trailing span of at least two measures after the final
/// cadence becomes a closing phrase.
pub fn detect_phrases(
    notes: &[Note],
    cadences: &[Cadence],
    sub_phrases: &[SubPhrase],
    last_measure: u32,
) -> Vec<Phrase> {
    let Some(first_note) = notes.first() else {
        return Vec::new();
    };

    let mut spans: Vec<(u32, u32, Option<Cadence>)> = Vec::new();
    let mut start = first_note.measure;
    for cadence in cadences {
        if cadence.measure < start {
            continue;
        }
        let end = cadence.measure;
        let length = end - start + 1;
        if length < MIN_PHRASE_MEASURES {
            // Too short to close; the cadence is absorbed into the next span
            continue;
        }
        if length > MAX_PHRASE_MEASURES {
            let midpoint = start + length / 2 - 1;
            spans.push((start, midpoint, None));
            spans.push((midpoint + 1, end, Some(cadence.clone())));
        } else {
            spans.push((start, end, Some(cadence.clone())));
        }
        start = end + 1;
    }
    if start <= last_measure && last_measure - start + 1 >= MIN_PHRASE_MEASURES {
        spans.push((start, last_measure, None));
    }

    build_phrases(spans, notes, sub_phrases)
}

/// Materialize phrases from measure spans and label them
fn build_phrases(
    spans: Vec<(u32, u32, Option<Cadence>)>,
    notes: &[Note],
    sub_phrases: &[SubPhrase],
) -> Vec<Phrase> {
    let mut phrases: Vec<Phrase> = Vec::with_capacity(spans.len());
    let mut letters_used: u32 = 0;

    for (index, (start, end, cadence)) in spans.into_iter().enumerate() {
        let phrase_notes: Vec<Note> = notes
            .iter()
            .filter(|n| n.measure >= start && n.measure <= end)
            .cloned()
            .collect();
        let phrase_subs: Vec<SubPhrase> = sub_phrases
            .iter()
            .filter(|s| s.start_measure >= start && s.end_measure <= end)
            .cloned()
            .collect();
        let closure = if cadence_strength(cadence.as_ref()) > 0.7 {
            Closure::Closed
        } else {
            Closure::Open
        };

        let (material, relationship, head_similarity) =
            label_phrase(&phrase_notes, &phrases, &mut letters_used);

        phrases.push(Phrase {
            index,
            start_measure: start,
            end_measure: end,
            cadence,
            notes: phrase_notes,
            sub_phrases: phrase_subs,
            material,
            closure,
            relationship,
            head_similarity,
        });
    }
    phrases
}

/// First half of a note stream, capped at eight notes
fn head(notes: &[Note]) -> &[Note] {
    let len = (notes.len() / 2).min(HEAD_CAP).max(1).min(notes.len());
    &notes[..len]
}

/// Last half of a note stream, capped at eight notes
fn tail(notes: &[Note]) -> &[Note] {
    let len = (notes.len() / 2).min(HEAD_CAP).max(1).min(notes.len());
    &notes[notes.len() - len..]
}

/// Assign material and relationship for a new phrase
///
/// The relationship is judged against the immediately preceding phrase; the
/// material label is taken from the best head match among all earlier
/// phrases so returning material is re-identified across interruptions.
fn label_phrase(
    notes: &[Note],
    earlier: &[Phrase],
    letters_used: &mut u32,
) -> (String, Option<PhraseRelationship>, Option<f64>) {
    if earlier.is_empty() {
        *letters_used = 1;
        return ("a".to_string(), None, None);
    }

    let prev = &earlier[earlier.len() - 1];
    let prev_head_sim = melodic_similarity(head(&prev.notes), head(notes));
    let prev_tail_sim = melodic_similarity(tail(&prev.notes), tail(notes));
    let relationship = if prev_head_sim > 0.7 && prev_tail_sim < 0.5 {
        PhraseRelationship::Parallel
    } else if prev_head_sim > 0.7 && prev_tail_sim > 0.7 {
        PhraseRelationship::Repetition
    } else if prev_head_sim < 0.3 {
        PhraseRelationship::Contrasting
    } else {
        PhraseRelationship::Development
    };

    let mut best_index = earlier.len() - 1;
    let mut best_sim = prev_head_sim;
    for candidate in earlier.iter().rev().skip(1) {
        let sim = melodic_similarity(head(&candidate.notes), head(notes));
        if sim > best_sim {
            best_sim = sim;
            best_index = candidate.index;
        }
    }
    let best = &earlier[best_index];
    let best_tail_sim = melodic_similarity(tail(&best.notes), tail(notes));

    let material = if best_sim > 0.7 && best_tail_sim < 0.5 {
        format!("{}'", best.material)
    } else if best_sim > 0.7 {
        format!("{}r", best.base_letter())
    } else if best_sim < 0.3 {
        let letter = next_letter(*letters_used);
        *letters_used += 1;
        letter.to_string()
    } else {
        format!("{}v", best.base_letter())
    };

    (material, Some(relationship), Some(best_sim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{PitchName, Step};
    use crate::models::structure::{CadenceStrength, CadenceType};

    fn note(step: Step, octave: i32, measure: u32, beat: f64) -> Note {
        Note::pitched(PitchName::natural(step, octave), 1.0, measure, beat, 0)
    }

    fn cadence(measure: u32, cadence_type: CadenceType) -> Cadence {
        Cadence {
            measure,
            beat: 0.0,
            cadence_type,
            strength: CadenceStrength::Strong,
            confidence: 0.9,
        }
    }

    /// A steady quarter-note melody across the given measures
    fn melody(measures: std::ops::RangeInclusive<u32>) -> Vec<Note> {
        let steps = [Step::C, Step::D, Step::E, Step::F];
        let mut notes = Vec::new();
        for measure in measures {
            for (i, &step) in steps.iter().enumerate() {
                notes.push(note(step, 4, measure, i as f64));
            }
        }
        notes
    }

    #[test]
    fn phrases_close_at_cadences() {
        let notes = melody(1..=8);
        let cadences = vec![
            cadence(4, CadenceType::Half),
            cadence(8, CadenceType::PerfectAuthentic),
        ];
        let phrases = detect_phrases(&notes, &cadences, &[], 8);
        assert_eq!(phrases.len(), 2);
        assert_eq!((phrases[0].start_measure, phrases[0].end_measure), (1, 4));
        assert_eq!((phrases[1].start_measure, phrases[1].end_measure), (5, 8));
        assert_eq!(phrases[0].closure, Closure::Open);
        assert_eq!(phrases[1].closure, Closure::Closed);
    }

    #[test]
    fn overlong_span_splits_at_midpoint() {
        let notes = melody(1..=14);
        let cadences = vec![cadence(14, CadenceType::PerfectAuthentic)];
        let phrases = detect_phrases(&notes, &cadences, &[], 14);
        assert_eq!(phrases.len(), 2);
        assert_eq!((phrases[0].start_measure, phrases[0].end_measure), (1, 7));
        assert_eq!((phrases[1].start_measure, phrases[1].end_measure), (8, 14));
        assert!(phrases[0].cadence.is_none());
        assert!(phrases[1].cadence.is_some());
    }

    #[test]
    fn trailing_measures_become_a_final_phrase() {
        let notes = melody(1..=7);
        let cadences = vec![cadence(4, CadenceType::PerfectAuthentic)];
        let phrases = detect_phrases(&notes, &cadences, &[], 7);
        assert_eq!(phrases.len(), 2);
        assert_eq!((phrases[1].start_measure, phrases[1].end_measure), (5, 7));
        assert_eq!(phrases[1].closure, Closure::Open);
    }

    #[test]
    fn identical_phrases_are_repetitions() {
        let notes = melody(1..=8);
        let cadences = vec![
            cadence(4, CadenceType::PerfectAuthentic),
            cadence(8, CadenceType::PerfectAuthentic),
        ];
        let phrases = detect_phrases(&notes, &cadences, &[], 8);
        assert_eq!(phrases[0].material, "a");
        assert_eq!(phrases[1].relationship, Some(PhraseRelationship::Repetition));
        assert_eq!(phrases[1].material, "ar");
    }

    #[test]
    fn every_phrase_length_is_in_bounds() {
        let notes = melody(1..=20);
        let cadences = vec![
            cadence(4, CadenceType::Half),
            cadence(18, CadenceType::PerfectAuthentic),
        ];
        let phrases = detect_phrases(&notes, &cadences, &[], 20);
        for phrase in &phrases {
            assert!(phrase.length() >= MIN_PHRASE_MEASURES);
            assert!(phrase.length() <= MAX_PHRASE_MEASURES);
        }
    }
}
