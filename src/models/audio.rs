//! Audio feature stream contract
//!
//! Frame-level features produced by the external audio decoder. The engine
//! consumes only the chroma frames (for alignment) and RMS / spectral
//! centroid scalars (for emotion overrides); the rest is carried through
//! export untouched.

use serde::{Deserialize, Serialize};

/// Per-node audio scalars used for emotion overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSummary {
    /// Mean RMS energy in [0, 1]
    pub rms: f64,
    /// Mean spectral centroid in Hz
    pub spectral_centroid: f64,
}

/// Frame-synchronous audio features from the decoder
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    /// RMS energy per frame, in [0, 1]
    #[serde(default)]
    pub rms: Vec<f64>,
    /// Spectral centroid per frame, Hz
    #[serde(default)]
    pub spectral_centroid: Vec<f64>,
    /// Zero-crossing rate per frame
    #[serde(default)]
    pub zcr: Vec<f64>,
    /// MFCC rows per frame
    #[serde(default)]
    pub mfcc: Vec<Vec<f64>>,
    /// Chroma rows per frame, 12 bins summing to about 1
    #[serde(default)]
    pub chroma: Vec<[f64; 12]>,
    /// Frame timestamps in seconds
    #[serde(default)]
    pub timestamps: Vec<f64>,
}

impl AudioFeatures {
    /// Mean RMS and spectral centroid for emotion overrides
    pub fn summary(&self) -> Option<AudioSummary> {
        if self.rms.is_empty() && self.spectral_centroid.is_empty() {
            return None;
        }
        let mean = |values: &[f64]| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };
        Some(AudioSummary {
            rms: mean(&self.rms),
            spectral_centroid: mean(&self.spectral_centroid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_averages_the_scalar_streams() {
        let features = AudioFeatures {
            rms: vec![0.2, 0.4, 0.6],
            spectral_centroid: vec![1000.0, 3000.0],
            ..AudioFeatures::default()
        };
        let summary = features.summary().expect("summary");
        assert!((summary.rms - 0.4).abs() < 1e-9);
        assert!((summary.spectral_centroid - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_streams_have_no_summary() {
        assert!(AudioFeatures::default().summary().is_none());
    }
}
