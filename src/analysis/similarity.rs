//! Similarity kernels
//!
//! Shared measures used by every structural detector: interval and rhythm
//! similarity, melodic similarity, contour, transposition, inversion, and
//! fragmentation. All kernels return 0 on empty input and never fail.

use crate::models::note::Note;
use crate::models::structure::Contour;

/// Blend weight of interval similarity in the melodic measure
const INTERVAL_WEIGHT: f64 = 0.6;
/// Blend weight of rhythm similarity in the melodic measure
const RHYTHM_WEIGHT: f64 = 0.4;

/// Position-wise similarity of two numeric sequences
///
/// Aligns on the shorter length, counts positions differing by at most 1 as
/// matches, and scales by a length penalty so truncations score lower.
pub fn compare_arrays(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let min_len = a.len().min(b.len());
    let max_len = a.len().max(b.len());
    let matches = (0..min_len).filter(|&i| (a[i] - b[i]).abs() <= 1.0).count();
    let length_penalty = 1.0 - (max_len - min_len) as f64 / max_len as f64;
    (matches as f64 / min_len as f64) * length_penalty
}

/// Similarity of two signed interval patterns
pub fn interval_similarity(a: &[i32], b: &[i32]) -> f64 {
    let a: Vec<f64> = a.iter().map(|&v| f64::from(v)).collect();
    let b: Vec<f64> = b.iter().map(|&v| f64::from(v)).collect();
    compare_arrays(&a, &b)
}

/// Similarity of two duration patterns
pub fn rhythm_similarity(a: &[f64], b: &[f64]) -> f64 {
    compare_arrays(a, b)
}

/// Signed semitone intervals between consecutive pitched notes
///
/// Rests are skipped; intervals bridge across them.
pub fn interval_pattern(notes: &[Note]) -> Vec<i32> {
    let midis: Vec<i32> = notes.iter().filter_map(|n| n.midi().map(i32::from)).collect();
    midis.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Durations of the notes in beats, rests included
pub fn rhythm_pattern(notes: &[Note]) -> Vec<f64> {
    notes.iter().map(|n| n.duration).collect()
}

/// Weighted blend of interval and rhythm similarity over two note streams
pub fn melodic_similarity(a: &[Note], b: &[Note]) -> f64 {
    let interval = interval_similarity(&interval_pattern(a), &interval_pattern(b));
    let rhythm = rhythm_similarity(&rhythm_pattern(a), &rhythm_pattern(b));
    INTERVAL_WEIGHT * interval + RHYTHM_WEIGHT * rhythm
}

/// Rounded mean MIDI offset from the first stream to the second
///
/// Returns 0 when either stream has no pitched notes.
pub fn detect_transposition(a: &[Note], b: &[Note]) -> i32 {
    let mean = |notes: &[Note]| -> Option<f64> {
        let midis: Vec<f64> = notes.iter().filter_map(|n| n.midi().map(f64::from)).collect();
        if midis.is_empty() {
            None
        } else {
            Some(midis.iter().sum::<f64>() / midis.len() as f64)
        }
    };
    match (mean(a), mean(b)) {
        (Some(m1), Some(m2)) => (m2 - m1).round() as i32,
        _ => 0,
    }
}

/// Net melodic direction of a note stream
pub fn contour(notes: &[Note]) -> Contour {
    let midis: Vec<i32> = notes.iter().filter_map(|n| n.midi().map(i32::from)).collect();
    match (midis.first(), midis.last()) {
        (Some(&first), Some(&last)) if last > first => Contour::Ascending,
        (Some(&first), Some(&last)) if last < first => Contour::Descending,
        _ => Contour::Static,
    }
}

/// Whether the second interval pattern mirrors the first
///
/// Requires equal length and `|a[i] + b[i]| <= 1` in at least 80% of
/// positions.
pub fn is_inversion(a: &[i32], b: &[i32]) -> bool {
    if a.is_empty() || a.len() != b.len() {
        return false;
    }
    let mirrored = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| (**x + **y).abs() <= 1)
        .count();
    mirrored as f64 / a.len() as f64 >= 0.8
}

/// Whether the second pattern is a fragment of the first
///
/// The fragment must be shorter than 80% of the original and its prefix must
/// match the original's truncated prefix with similarity above 0.7.
pub fn is_fragmentation(original: &[i32], candidate: &[i32]) -> bool {
    if candidate.is_empty() || original.is_empty() {
        return false;
    }
    if (candidate.len() as f64) >= 0.8 * original.len() as f64 {
        return false;
    }
    let prefix = &original[..candidate.len().min(original.len())];
    interval_similarity(prefix, candidate) > 0.7
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{Note, PitchName, Step};

    fn melody(midi_steps: &[(Step, i32)]) -> Vec<Note> {
        midi_steps
            .iter()
            .enumerate()
            .map(|(i, &(step, octave))| {
                Note::pitched(PitchName::natural(step, octave), 1.0, 1, i as f64, 0)
            })
            .collect()
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(compare_arrays(&[], &[1.0]), 0.0);
        assert_eq!(interval_similarity(&[], &[]), 0.0);
        assert_eq!(melodic_similarity(&[], &[]), 0.0);
        assert_eq!(detect_transposition(&[], &[]), 0);
    }

    #[test]
    fn identical_sequences_are_fully_similar() {
        let a = [2.0, 2.0, 1.0];
        assert!((compare_arrays(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn near_matches_count_within_tolerance() {
        // Every position differs by exactly 1, so all positions match
        assert!((compare_arrays(&[2.0, 3.0], &[3.0, 2.0]) - 1.0).abs() < 1e-9);
        // A difference of 2 does not match
        assert!(compare_arrays(&[2.0, 4.0], &[2.0, 6.0]) < 1.0);
    }

    #[test]
    fn length_mismatch_is_penalized() {
        let score = compare_arrays(&[1.0, 1.0], &[1.0, 1.0, 1.0, 1.0]);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn transposition_of_a_fifth() {
        let a = melody(&[(Step::C, 4), (Step::D, 4), (Step::E, 4)]);
        let b = melody(&[(Step::G, 4), (Step::A, 4), (Step::B, 4)]);
        assert_eq!(detect_transposition(&a, &b), 7);
    }

    #[test]
    fn contour_classification() {
        assert_eq!(contour(&melody(&[(Step::C, 4), (Step::E, 4)])), Contour::Ascending);
        assert_eq!(contour(&melody(&[(Step::E, 4), (Step::C, 4)])), Contour::Descending);
        assert_eq!(contour(&melody(&[(Step::C, 4), (Step::C, 4)])), Contour::Static);
        assert_eq!(contour(&[]), Contour::Static);
    }

    #[test]
    fn inversion_requires_mirrored_intervals() {
        assert!(is_inversion(&[2, 2, -1], &[-2, -2, 1]));
        assert!(!is_inversion(&[2, 2, -1], &[2, 2, -1]));
        assert!(!is_inversion(&[2, 2], &[-2, -2, 1]));
    }

    #[test]
    fn fragmentation_requires_shortening() {
        assert!(is_fragmentation(&[2, 2, 1, -2, -2], &[2, 2]));
        assert!(!is_fragmentation(&[2, 2], &[2, 2]));
        assert!(!is_fragmentation(&[2, 2, 1, -2, -2], &[-5, 7]));
    }
}
