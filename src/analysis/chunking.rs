//! Chunked processing for long scores
//!
//! Partitions the measure range into overlapping windows and runs the local
//! detectors (motive grouping, sub-phrase segmentation) per window; the
//! harmonically global detectors always see the full stream. A failing
//! window is logged and skipped; the global pipeline proceeds with whatever
//! the remaining windows produced.

use crate::error::AnalysisError;
use crate::models::note::Note;
use crate::models::score::ParsedScore;
use crate::analysis::motive::MotiveGroup;
use crate::analysis::subphrase::SubPhraseSegment;
use crate::analysis::{motive, subphrase};

/// Chunking thresholds and window geometry
#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions {
    /// Notes per window before chunking engages (at twice this count)
    pub max_notes_per_chunk: usize,
    /// Measures per window
    pub max_measures_per_chunk: u32,
    /// Overlap between consecutive windows in measures
    pub overlap_measures: u32,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self { max_notes_per_chunk: 1000, max_measures_per_chunk: 32, overlap_measures: 4 }
    }
}

impl ChunkOptions {
    /// Whether a score is small enough for the direct path
    pub fn fits_direct(&self, score: &ParsedScore) -> bool {
        score.notes.len() < 2 * self.max_notes_per_chunk
            && score.measure_count() < 2 * self.max_measures_per_chunk as usize
    }
}

/// One overlapping window over the measure range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    /// First measure of the window
    pub start: u32,
    /// Last measure of the window, inclusive
    pub end: u32,
}

/// Partition the measure range into overlapping windows
pub fn windows(last_measure: u32, options: &ChunkOptions) -> Vec<ChunkWindow> {
    let mut result = Vec::new();
    if last_measure == 0 {
        return result;
    }
    let stride = options
        .max_measures_per_chunk
        .saturating_sub(options.overlap_measures)
        .max(1);
    let mut start = 1u32;
    loop {
        let end = (start + options.max_measures_per_chunk - 1).min(last_measure);
        result.push(ChunkWindow { start, end });
        if end >= last_measure {
            break;
        }
        start += stride;
    }
    result
}

/// Local detector yield of one window
struct ChunkYield {
    motive_groups: Vec<MotiveGroup>,
    segments: Vec<SubPhraseSegment>,
}

/// Run the local detectors on one window
fn run_window(
    score: &ParsedScore,
    window: ChunkWindow,
) -> Result<ChunkYield, AnalysisError> {
    if window.start > window.end {
        return Err(AnalysisError::ChunkFailure {
            start: window.start,
            end: window.end,
            reason: "window range is inverted".to_string(),
        });
    }
    let slice: Vec<Note> = score.notes_in_range(window.start, window.end);
    let motive_groups = motive::collect_motive_groups(&slice, &score.time_signature);
    let segments = subphrase::segment_sub_phrases(&slice, &score.time_signature);
    Ok(ChunkYield { motive_groups, segments })
}

/// Motive groups and sub-phrase segments for the whole score, chunked
///
/// Windows are processed in order; items from a window that start in the
/// first half of its overlap with the preceding window are dropped in favour
/// of the preceding window's copies. The surviving items are classified and
/// labelled globally, so chunking never changes materials away from
/// boundaries.
pub fn collect_chunked(
    score: &ParsedScore,
    options: &ChunkOptions,
) -> (Vec<MotiveGroup>, Vec<SubPhraseSegment>, usize, usize) {
    let windows = windows(score.last_measure(), options);
    let chunk_count = windows.len();
    let mut skipped = 0usize;
    let mut motive_groups: Vec<MotiveGroup> = Vec::new();
    let mut segments: Vec<SubPhraseSegment> = Vec::new();

    for (i, window) in windows.iter().enumerate() {
        match run_window(score, *window) {
            Ok(yielded) => {
                // Each window owns the measures from its own overlap
                // midpoint up to the next window's midpoint, so the merged
                // stream has neither gaps nor duplicates
                let own_start = if i == 0 {
                    window.start
                } else {
                    window.start + options.overlap_measures / 2
                };
                let own_end = windows
                    .get(i + 1)
                    .map_or(window.end, |next| next.start + options.overlap_measures / 2 - 1);
                motive_groups.extend(
                    yielded
                        .motive_groups
                        .into_iter()
                        .filter(|(measure, _, _)| *measure >= own_start && *measure <= own_end),
                );
                segments.extend(yielded.segments.into_iter().filter(
                    |(measure, _, _, _)| *measure >= own_start && *measure <= own_end,
                ));
            }
            Err(error) => {
                log::warn!(
                    "skipping chunk covering measures {}..={}: {}",
                    window.start,
                    window.end,
                    error
                );
                skipped += 1;
            }
        }
    }

    (motive_groups, segments, chunk_count, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{PitchName, Step};
    use crate::models::score::{KeySignature, Measure, TimeSignature};

    fn long_score(measure_count: u32) -> ParsedScore {
        let steps = [Step::C, Step::D, Step::E, Step::G];
        let notes: Vec<Note> = (1..=measure_count)
            .flat_map(|measure| {
                steps.iter().enumerate().map(move |(i, &step)| {
                    Note::pitched(PitchName::natural(step, 4), 1.0, measure, i as f64, 0)
                })
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
    fn windows_cover_the_whole_range_with_overlap() {
        let options = ChunkOptions::default();
        let windows = windows(100, &options);
        assert_eq!(windows[0], ChunkWindow { start: 1, end: 32 });
        assert_eq!(windows[1], ChunkWindow { start: 29, end: 60 });
        assert_eq!(windows.last(), Some(&ChunkWindow { start: 85, end: 100 }));
        for pair in windows.windows(2) {
            assert!(pair[1].start <= pair[0].end + 1);
        }
    }

    #[test]
    fn no_windows_for_an_empty_range() {
        assert!(windows(0, &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn chunked_collection_matches_direct_collection() {
        let score = long_score(100);
        let options = ChunkOptions::default();
        let (groups, segments, chunk_count, skipped) = collect_chunked(&score, &options);
        let direct_groups =
            motive::collect_motive_groups(&score.notes, &score.time_signature);
        let direct_segments =
            subphrase::segment_sub_phrases(&score.notes, &score.time_signature);
        assert_eq!(groups, direct_groups);
        assert_eq!(segments, direct_segments);
        assert!(chunk_count > 1);
        assert_eq!(skipped, 0);
    }
}
