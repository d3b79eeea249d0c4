//! Score-to-audio alignment
//!
//! Maps measure numbers to audio timestamps and back by warping the
//! symbolic chroma rendering of the score against acoustic chroma frames.

pub mod chroma;
pub mod dtw;

use std::collections::BTreeMap;

use crate::models::score::ParsedScore;
use self::chroma::{symbolic_chroma, FRAMES_PER_MEASURE};
use self::dtw::{dtw, path_confidence};

/// Resolution of the reverse (time to measure) lookup in seconds
const TIME_QUANTUM: f64 = 0.1;
/// Confidence lost per manual adjustment
const ADJUST_PENALTY: f64 = 0.05;
/// Manual adjustments never push confidence below this
const ADJUST_FLOOR: f64 = 0.5;

/// Bidirectional measure/time mapping produced by the aligner
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    /// Aligned frame index pairs (symbolic, acoustic)
    pub path: Vec<(usize, usize)>,
    /// Measure number to audio timestamp, seconds
    pub measure_to_time: BTreeMap<u32, f64>,
    /// Deci-second-quantised timestamp to measure number
    pub time_to_measure: BTreeMap<i64, u32>,
    /// Alignment confidence in [0, 1]
    pub confidence: f64,
    /// Accumulated DTW path cost
    pub distance: f64,
}

impl AlignmentResult {
    /// A degenerate result for empty inputs
    pub fn degenerate() -> Self {
        Self {
            path: Vec::new(),
            measure_to_time: BTreeMap::new(),
            time_to_measure: BTreeMap::new(),
            confidence: 0.0,
            distance: f64::INFINITY,
        }
    }

    /// Rebuild a result from a persisted measure map
    pub fn from_measure_map(measure_to_time: BTreeMap<u32, f64>, confidence: f64) -> Self {
        let time_to_measure = reverse_map(&measure_to_time);
        Self {
            path: Vec::new(),
            measure_to_time,
            time_to_measure,
            confidence,
            distance: 0.0,
        }
    }

    /// Timestamp for a measure, interpolating between known neighbours
    ///
    /// Measures outside the mapped range clamp to the nearest known
    /// timestamp; an empty mapping returns 0 by convention.
    pub fn time_for_measure(&self, measure: u32) -> f64 {
        if let Some(&exact) = self.measure_to_time.get(&measure) {
            return exact;
        }
        let before = self.measure_to_time.range(..=measure).next_back();
        let after = self.measure_to_time.range(measure..).next();
        match (before, after) {
            (Some((&m0, &t0)), Some((&m1, &t1))) if m1 > m0 => {
                let fraction = f64::from(measure - m0) / f64::from(m1 - m0);
                t0 + fraction * (t1 - t0)
            }
            (Some((_, &t0)), None) => t0,
            (None, Some((_, &t1))) => t1,
            _ => 0.0,
        }
    }

    /// Measure for a timestamp by nearest quantised key
    pub fn measure_for_time(&self, time: f64) -> u32 {
        let key = quantise(time);
        let below = self.time_to_measure.range(..=key).next_back();
        let above = self.time_to_measure.range(key..).next();
        match (below, above) {
            (Some((&k0, &m0)), Some((&k1, &m1))) => {
                if (key - k0) <= (k1 - key) {
                    m0
                } else {
                    m1
                }
            }
            (Some((_, &m0)), None) => m0,
            (None, Some((_, &m1))) => m1,
            _ => 0,
        }
    }

    /// Manually pin a measure to a timestamp
    ///
    /// Both directions are overwritten and the confidence drops by a small
    /// step, never below the floor.
    pub fn adjust(&mut self, measure: u32, time: f64) {
        self.measure_to_time.insert(measure, time);
        self.time_to_measure = reverse_map(&self.measure_to_time);
        self.confidence = (self.confidence - ADJUST_PENALTY).max(ADJUST_FLOOR);
    }
}

fn quantise(time: f64) -> i64 {
    (time / TIME_QUANTUM).round() as i64
}

fn reverse_map(measure_to_time: &BTreeMap<u32, f64>) -> BTreeMap<i64, u32> {
    measure_to_time.iter().map(|(&m, &t)| (quantise(t), m)).collect()
}

/// Align a score against acoustic chroma frames with their timestamps
///
/// Either side being empty yields the degenerate result; otherwise the DTW
/// path is projected onto measure starts to build both mappings.
pub fn align_score(
    score: &ParsedScore,
    acoustic: &[[f64; 12]],
    timestamps: &[f64],
) -> AlignmentResult {
    let symbolic = symbolic_chroma(score);
    if symbolic.is_empty() || acoustic.is_empty() {
        return AlignmentResult::degenerate();
    }
    let result = dtw(&symbolic, acoustic);
    if result.path.is_empty() {
        return AlignmentResult::degenerate();
    }

    let mut measure_to_time: BTreeMap<u32, f64> = BTreeMap::new();
    for &(symbolic_index, acoustic_index) in &result.path {
        if symbolic_index % FRAMES_PER_MEASURE != 0 {
            continue;
        }
        let measure = (symbolic_index / FRAMES_PER_MEASURE) as u32 + 1;
        let time = timestamps
            .get(acoustic_index)
            .copied()
            .unwrap_or(acoustic_index as f64 * TIME_QUANTUM);
        // The first aligned frame of each measure wins
        measure_to_time.entry(measure).or_insert(time);
    }

    let confidence = path_confidence(result.distance, symbolic.len(), acoustic.len());
    let time_to_measure = reverse_map(&measure_to_time);
    AlignmentResult {
        path: result.path,
        measure_to_time,
        time_to_measure,
        confidence,
        distance: result.distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{Note, PitchName, Step};
    use crate::models::score::{KeySignature, Measure, TimeSignature};

    fn held_note_score(measure_count: u32) -> ParsedScore {
        let steps = [Step::C, Step::E, Step::G, Step::A];
        let notes: Vec<Note> = (1..=measure_count)
            .map(|measure| {
                let step = steps[(measure as usize - 1) % steps.len()];
                Note::pitched(PitchName::natural(step, 4), 4.0, measure, 0.0, 0)
            })
            .collect();
        ParsedScore::new(
            (1..=measure_count).map(|number| Measure { number }).collect(),
            notes,
            KeySignature::default(),
            TimeSignature::default(),
        )
    }

    #[test]
    fn self_alignment_is_diagonal_with_full_confidence() {
        let score = held_note_score(4);
        let symbolic = symbolic_chroma(&score);
        let timestamps: Vec<f64> = (0..symbolic.len()).map(|i| i as f64 * 0.5).collect();
        let alignment = align_score(&score, &symbolic, &timestamps);
        assert!((alignment.confidence - 1.0).abs() < 1e-9);
        assert_eq!(alignment.measure_to_time.len(), 4);
        assert!((alignment.time_for_measure(1) - 0.0).abs() < 1e-9);
        assert!((alignment.time_for_measure(2) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn interpolation_between_known_measures() {
        let mut map = BTreeMap::new();
        map.insert(1, 0.0);
        map.insert(3, 4.0);
        let alignment = AlignmentResult::from_measure_map(map, 0.9);
        assert!((alignment.time_for_measure(2) - 2.0).abs() < 1e-9);
        assert!((alignment.time_for_measure(10) - 4.0).abs() < 1e-9);
        assert_eq!(alignment.measure_for_time(3.9), 3);
        assert_eq!(alignment.measure_for_time(0.4), 1);
    }

    #[test]
    fn degenerate_inputs_return_the_convention_values() {
        let score = held_note_score(2);
        let alignment = align_score(&score, &[], &[]);
        assert!(alignment.path.is_empty());
        assert!(alignment.distance.is_infinite());
        assert_eq!(alignment.time_for_measure(1), 0.0);
    }

    #[test]
    fn manual_adjustment_overwrites_and_decays_confidence() {
        let mut map = BTreeMap::new();
        map.insert(1, 0.0);
        map.insert(2, 2.0);
        let mut alignment = AlignmentResult::from_measure_map(map, 0.9);
        alignment.adjust(2, 2.5);
        assert!((alignment.time_for_measure(2) - 2.5).abs() < 1e-9);
        assert!((alignment.confidence - 0.85).abs() < 1e-9);
        for _ in 0..20 {
            alignment.adjust(2, 2.5);
        }
        assert!((alignment.confidence - 0.5).abs() < 1e-9);
    }
}
