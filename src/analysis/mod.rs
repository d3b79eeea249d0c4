//! Structural analysis pipeline
//!
//! Orchestrates the detectors from cadences up to the form label and the
//! structure tree. Small scores run the direct path; long scores go through
//! the chunked driver for the local detectors while the harmonically global
//! detectors always see the whole stream.

pub mod cadence;
pub mod chunking;
pub mod form;
pub mod mode;
pub mod motive;
pub mod period;
pub mod phrase;
pub mod similarity;
pub mod subphrase;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AnalysisError;
use crate::models::form::{AuxiliaryStructures, FormAnalysis, MeasureSpan, Theme};
use crate::models::score::ParsedScore;
use crate::models::structure::{Cadence, Motive, Period, Phrase, SubPhrase};
use crate::tree::{builder, StructureTree, TooltipData, MODEL_VERSION};

use self::chunking::ChunkOptions;
use self::mode::ModeDetection;

/// Aggregate counts and ranges reported alongside the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Total notes, rests included
    pub note_count: usize,
    /// Total measures
    pub measure_count: usize,
    /// Lowest and highest MIDI pitch, when any note is pitched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midi_range: Option<(u8, u8)>,
    /// Distinct phrase material letters
    pub distinct_materials: usize,
    /// Mean phrase length in measures
    pub mean_phrase_length: f64,
}

/// How the analysis was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInfo {
    /// Analysis model version
    pub model_version: String,
    /// Whether the chunked driver ran
    pub chunked: bool,
    /// Number of windows processed
    pub chunk_count: usize,
    /// Windows skipped after a failure
    pub skipped_chunks: usize,
}

/// Complete structural analysis of one score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysis {
    /// The assembled structure tree
    pub tree: StructureTree,
    /// Detected motives in score order
    pub motives: Vec<Motive>,
    /// Detected sub-phrases in score order
    pub sub_phrases: Vec<SubPhrase>,
    /// Detected phrases in score order
    pub phrases: Vec<Phrase>,
    /// Detected periods in score order
    pub periods: Vec<Period>,
    /// Detected cadences sorted by measure
    pub cadences: Vec<Cadence>,
    /// Overall form
    pub form: FormAnalysis,
    /// Best-fitting scale
    pub mode: ModeDetection,
    /// Recurring materials and their occurrences
    pub themes: Vec<Theme>,
    /// Introduction, coda, transitions, extensions
    pub auxiliaries: AuxiliaryStructures,
    /// Aggregate counts
    pub statistics: Statistics,
    /// Tooltips for every tree node, keyed by node id
    pub tooltips: BTreeMap<String, TooltipData>,
    /// Pipeline provenance
    pub processing: ProcessingInfo,
}

/// Analyze a score, choosing direct or chunked processing automatically
pub fn analyze_complete(score: &ParsedScore) -> Result<FullAnalysis, AnalysisError> {
    let options = ChunkOptions::default();
    let force_chunked = !options.fits_direct(score);
    analyze_with(score, &options, force_chunked)
}

/// Analyze a score through the chunked driver unconditionally
pub fn analyze_complete_chunked(score: &ParsedScore) -> Result<FullAnalysis, AnalysisError> {
    analyze_with(score, &ChunkOptions::default(), true)
}

fn analyze_with(
    score: &ParsedScore,
    options: &ChunkOptions,
    chunked: bool,
) -> Result<FullAnalysis, AnalysisError> {
    score.validate()?;

    // Local detectors, direct or chunked
    let (motives, sub_phrases, chunk_count, skipped_chunks) = if chunked {
        let (groups, segments, chunk_count, skipped) =
            chunking::collect_chunked(score, options);
        let motives = motive::classify_motive_groups(groups);
        let sub_phrases = subphrase::label_segments(segments, &motives);
        (motives, sub_phrases, chunk_count, skipped)
    } else {
        let motives = motive::detect_motives(&score.notes, &score.time_signature);
        let sub_phrases =
            subphrase::detect_sub_phrases(&score.notes, &score.time_signature, &motives);
        (motives, sub_phrases, 1, 0)
    };

    // Harmonic context is global: these always see the whole stream
    let cadences = cadence::detect_cadences(score);
    let phrases =
        phrase::detect_phrases(&score.notes, &cadences, &sub_phrases, score.last_measure());
    let periods = period::detect_periods(&phrases);
    let form = form::classify_form(&periods);
    let auxiliaries = form::detect_auxiliaries(&periods, &phrases, score.last_measure());
    let mode = mode::detect_mode(score);

    let tree = builder::build_hierarchy(score, &form, &periods, &motives);
    let tooltips = tree.tooltip_map();
    let themes = extract_themes(&periods);
    let statistics = compute_statistics(score, &phrases);

    Ok(FullAnalysis {
        tree,
        motives,
        sub_phrases,
        phrases,
        periods,
        cadences,
        form,
        mode,
        themes,
        auxiliaries,
        statistics,
        tooltips,
        processing: ProcessingInfo {
            model_version: MODEL_VERSION.to_string(),
            chunked,
            chunk_count,
            skipped_chunks,
        },
    })
}

/// Group periods by material letter into themes
fn extract_themes(periods: &[Period]) -> Vec<Theme> {
    let mut themes: Vec<Theme> = Vec::new();
    for period in periods {
        let label = period.base_letter().to_string();
        let span = MeasureSpan {
            start_measure: period.start_measure,
            end_measure: period.end_measure,
        };
        match themes.iter_mut().find(|t| t.label == label) {
            Some(theme) => theme.occurrences.push(span),
            None => themes.push(Theme {
                label,
                start_measure: period.start_measure,
                end_measure: period.end_measure,
                occurrences: vec![span],
            }),
        }
    }
    themes
}

/// Aggregate counts over the score and phrase list
fn compute_statistics(score: &ParsedScore, phrases: &[Phrase]) -> Statistics {
    let midis: Vec<u8> = score.notes.iter().filter_map(|n| n.midi()).collect();
    let midi_range = match (midis.iter().min(), midis.iter().max()) {
        (Some(&low), Some(&high)) => Some((low, high)),
        _ => None,
    };
    let mut letters: Vec<char> = phrases.iter().map(Phrase::base_letter).collect();
    letters.sort_unstable();
    letters.dedup();
    let mean_phrase_length = if phrases.is_empty() {
        0.0
    } else {
        phrases.iter().map(|p| f64::from(p.length())).sum::<f64>() / phrases.len() as f64
    };
    Statistics {
        note_count: score.notes.len(),
        measure_count: score.measure_count(),
        midi_range,
        distinct_materials: letters.len(),
        mean_phrase_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{Note, PitchName, Step};
    use crate::models::score::{KeySignature, Measure, TimeSignature};

    fn tiny_score() -> ParsedScore {
        let notes = vec![
            Note::pitched(PitchName::natural(Step::C, 4), 4.0, 1, 0.0, 0),
            Note::pitched(PitchName::natural(Step::G, 3), 4.0, 2, 0.0, 0),
        ];
        ParsedScore::new(
            vec![Measure { number: 1 }, Measure { number: 2 }],
            notes,
            KeySignature::default(),
            TimeSignature::default(),
        )
    }

    #[test]
    fn analysis_of_a_tiny_score_is_not_an_error() {
        let analysis = analyze_complete(&tiny_score()).expect("analysis");
        assert!(analysis.motives.is_empty());
        assert_eq!(analysis.statistics.note_count, 2);
        assert!(!analysis.processing.chunked);
    }

    #[test]
    fn invalid_scores_are_rejected() {
        let mut score = tiny_score();
        score.notes[0].measure = 9;
        score.notes.swap(0, 1);
        assert!(analyze_complete(&score).is_err());
    }

    #[test]
    fn themes_group_periods_by_letter() {
        use crate::models::structure::{Closure, PeriodType, Proportion};
        let period = |index: usize, start: u32, material: &str| Period {
            index,
            start_measure: start,
            end_measure: start + 3,
            phrases: Vec::new(),
            phrase_count: 0,
            period_type: PeriodType::Parallel,
            proportion: Proportion::Square,
            closure: Closure::Closed,
            material: material.to_string(),
            cadence: None,
        };
        let themes = extract_themes(&[
            period(0, 1, "a"),
            period(1, 5, "b"),
            period(2, 9, "a'"),
        ]);
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].occurrences.len(), 2);
    }
}
