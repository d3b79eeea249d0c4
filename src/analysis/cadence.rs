//! Cadence detection
//!
//! Classifies two-measure bass/soprano transitions against a fixed pattern
//! table. Output is sorted by measure with strictly increasing measure
//! numbers; when two cadences land on adjacent measures the weaker one is
//! suppressed so a phrase ending never reports both its approach and its
//! arrival.

use crate::models::note::Note;
use crate::models::score::{KeyMode, ParsedScore};
use crate::models::structure::{Cadence, CadenceStrength, CadenceType};
use crate::pitch::{scale_degree, tonic_pitch_class};

/// Lowest pitched note of a measure slice
fn bass_note<'a>(notes: &[&'a Note]) -> Option<&'a Note> {
    notes
        .iter()
        .filter(|n| !n.is_rest())
        .min_by_key(|n| n.midi().unwrap_or(u8::MAX))
        .copied()
}

/// Highest pitched note of a measure slice
fn soprano_note<'a>(notes: &[&'a Note]) -> Option<&'a Note> {
    notes
        .iter()
        .filter(|n| !n.is_rest())
        .max_by_key(|n| n.midi().unwrap_or(0))
        .copied()
}

/// Classify one bass/soprano transition, first matching row wins
fn classify(
    prev_degree: i8,
    curr_degree: i8,
    melody_degree: i8,
    mode: KeyMode,
) -> Option<(CadenceType, CadenceStrength, f64)> {
    if prev_degree == 4 && curr_degree == 0 && melody_degree == 0 {
        return Some((CadenceType::PerfectAuthentic, CadenceStrength::Strong, 0.95));
    }
    if prev_degree == 4 && curr_degree == 0 {
        return Some((CadenceType::ImperfectAuthentic, CadenceStrength::Moderate, 0.8));
    }
    if (prev_degree == 4 || prev_degree == 6) && curr_degree == 0 {
        return Some((CadenceType::ImperfectAuthentic, CadenceStrength::Moderate, 0.75));
    }
    // The Phrygian row is more specific than the generic arrival-on-V row
    // and must win when both apply
    if mode == KeyMode::Minor && prev_degree == 3 && curr_degree == 4 {
        return Some((CadenceType::Phrygian, CadenceStrength::Weak, 0.7));
    }
    if curr_degree == 4 {
        return Some((CadenceType::Half, CadenceStrength::Weak, 0.8));
    }
    if prev_degree == 4 && curr_degree == 5 {
        return Some((CadenceType::Deceptive, CadenceStrength::Moderate, 0.85));
    }
    if prev_degree == 3 && curr_degree == 0 {
        return Some((CadenceType::Plagal, CadenceStrength::Moderate, 0.75));
    }
    None
}

/// Detect cadences over the whole score
///
/// Every adjacent measure pair with notes on both sides is examined: the
/// lowest note of each measure gives the bass motion, the highest note of
/// the arrival measure gives the melody degree.
pub fn detect_cadences(score: &ParsedScore) -> Vec<Cadence> {
    let tonic = tonic_pitch_class(score.key_signature.fifths, score.key_signature.mode);
    let mode = score.key_signature.mode;
    let last = score.last_measure();
    let mut cadences = Vec::new();

    for measure in 1..last {
        let prev_notes: Vec<&Note> = score.notes_in_measure(measure).collect();
        let curr_notes: Vec<&Note> = score.notes_in_measure(measure + 1).collect();
        if prev_notes.is_empty() || curr_notes.is_empty() {
            continue;
        }
        let (Some(prev_bass), Some(curr_bass), Some(soprano)) =
            (bass_note(&prev_notes), bass_note(&curr_notes), soprano_note(&curr_notes))
        else {
            continue;
        };

        let prev_degree = prev_bass.pitch.as_ref().map_or(-1, |p| scale_degree(p, tonic));
        let curr_degree = curr_bass.pitch.as_ref().map_or(-1, |p| scale_degree(p, tonic));
        let melody_degree = soprano.pitch.as_ref().map_or(-1, |p| scale_degree(p, tonic));

        if let Some((cadence_type, strength, confidence)) =
            classify(prev_degree, curr_degree, melody_degree, mode)
        {
            cadences.push(Cadence {
                measure: measure + 1,
                beat: curr_bass.beat,
                cadence_type,
                strength,
                confidence,
            });
        }
    }

    suppress_adjacent(cadences)
}

/// Keep the stronger of any two cadences on adjacent measures
///
/// A half cadence one measure before an authentic arrival is the approach to
/// that arrival, not an independent closure. Ties keep the later cadence.
fn suppress_adjacent(cadences: Vec<Cadence>) -> Vec<Cadence> {
    let mut kept: Vec<Cadence> = Vec::with_capacity(cadences.len());
    for cadence in cadences {
        if let Some(last) = kept.last() {
            if cadence.measure == last.measure + 1 {
                if cadence.cadence_type.strength() >= last.cadence_type.strength() {
                    kept.pop();
                } else {
                    continue;
                }
            }
        }
        kept.push(cadence);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{Note, PitchName, Step};
    use crate::models::score::{KeySignature, Measure, ParsedScore, TimeSignature};

    fn measures(count: u32) -> Vec<Measure> {
        (1..=count).map(|number| Measure { number }).collect()
    }

    /// One bass note plus one soprano note per measure
    fn two_voice_score(bass: &[Step], soprano: &[Step], mode: KeyMode) -> ParsedScore {
        let mut notes = Vec::new();
        for (i, (&b, &s)) in bass.iter().zip(soprano.iter()).enumerate() {
            let measure = i as u32 + 1;
            notes.push(Note::pitched(PitchName::natural(b, 3), 4.0, measure, 0.0, 1));
            notes.push(Note::pitched(PitchName::natural(s, 5), 4.0, measure, 0.0, 0));
        }
        notes.sort_by(|a, b| {
            a.measure
                .cmp(&b.measure)
                .then(a.beat.partial_cmp(&b.beat).unwrap())
                .then(a.voice.cmp(&b.voice))
        });
        ParsedScore::new(
            measures(bass.len() as u32),
            notes,
            KeySignature { fifths: 0, mode },
            TimeSignature::default(),
        )
    }

    #[test]
    fn authentic_cadence_with_melodic_tonic_is_perfect() {
        // I-IV-V-I with the soprano holding the tonic
        let score = two_voice_score(
            &[Step::C, Step::F, Step::G, Step::C],
            &[Step::C, Step::C, Step::C, Step::C],
            KeyMode::Major,
        );
        let cadences = detect_cadences(&score);
        assert_eq!(cadences.len(), 1);
        assert_eq!(cadences[0].measure, 4);
        assert_eq!(cadences[0].cadence_type, CadenceType::PerfectAuthentic);
        assert_eq!(cadences[0].strength, CadenceStrength::Strong);
        assert!((cadences[0].confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn authentic_cadence_without_melodic_tonic_is_imperfect() {
        let score = two_voice_score(
            &[Step::G, Step::C],
            &[Step::D, Step::E],
            KeyMode::Major,
        );
        let cadences = detect_cadences(&score);
        assert_eq!(cadences.len(), 1);
        assert_eq!(cadences[0].cadence_type, CadenceType::ImperfectAuthentic);
        assert!((cadences[0].confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn deceptive_cadence_lands_on_the_sixth_degree() {
        let score = two_voice_score(
            &[Step::C, Step::G, Step::A],
            &[Step::E, Step::D, Step::C],
            KeyMode::Major,
        );
        let cadences = detect_cadences(&score);
        // Half at measure 2 is suppressed by the deceptive arrival at 3
        assert_eq!(cadences.len(), 1);
        assert_eq!(cadences[0].measure, 3);
        assert_eq!(cadences[0].cadence_type, CadenceType::Deceptive);
    }

    #[test]
    fn phrygian_cadence_only_in_minor() {
        // In A minor: bass F (iv degree 3 above A... using parallel scale
        // degrees) moving to E (dominant)
        let minor = two_voice_score(&[Step::D, Step::E], &[Step::F, Step::E], KeyMode::Minor);
        let cadences = detect_cadences(&minor);
        assert_eq!(cadences.len(), 1);
        assert_eq!(cadences[0].cadence_type, CadenceType::Phrygian);

        let major = two_voice_score(&[Step::D, Step::E], &[Step::F, Step::E], KeyMode::Major);
        assert!(detect_cadences(&major)
            .iter()
            .all(|c| c.cadence_type != CadenceType::Phrygian));
    }

    #[test]
    fn output_is_sorted_with_strictly_increasing_measures() {
        let score = two_voice_score(
            &[Step::C, Step::G, Step::C, Step::F, Step::G, Step::C],
            &[Step::C, Step::D, Step::C, Step::A, Step::B, Step::C],
            KeyMode::Major,
        );
        let cadences = detect_cadences(&score);
        for pair in cadences.windows(2) {
            assert!(pair[0].measure < pair[1].measure);
        }
    }
}
