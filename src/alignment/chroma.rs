//! Symbolic chroma derivation
//!
//! Renders the note stream into a fixed-rate chroma sequence (ten frames per
//! measure) so the aligner can compare it against acoustic chroma. Each
//! frame weighs pitch classes by how long they sound inside the frame, then
//! L1-normalises.

use crate::models::score::ParsedScore;

/// Chroma frames rendered per measure
pub const FRAMES_PER_MEASURE: usize = 10;

/// Render the score into per-frame chroma vectors
pub fn symbolic_chroma(score: &ParsedScore) -> Vec<[f64; 12]> {
    let last_measure = score.last_measure();
    if last_measure == 0 {
        return Vec::new();
    }
    let beats = score.beats_per_measure();
    let frame_beats = beats / FRAMES_PER_MEASURE as f64;
    let mut frames = vec![[0.0f64; 12]; last_measure as usize * FRAMES_PER_MEASURE];

    for note in &score.notes {
        let Some(pitch) = &note.pitch else {
            continue;
        };
        let bin = usize::from(pitch.pitch_class());
        let note_start = note.beat;
        let note_end = note.beat + note.duration.max(0.0);
        let measure_base = (note.measure - 1) as usize * FRAMES_PER_MEASURE;
        for frame in 0..FRAMES_PER_MEASURE {
            let frame_start = frame as f64 * frame_beats;
            let frame_end = frame_start + frame_beats;
            let overlap = (note_end.min(frame_end) - note_start.max(frame_start)).max(0.0);
            if overlap > 0.0 {
                frames[measure_base + frame][bin] += overlap;
            }
        }
    }

    for frame in &mut frames {
        let total: f64 = frame.iter().sum();
        if total > 0.0 {
            for bin in frame.iter_mut() {
                *bin /= total;
            }
        }
    }
    frames
}
