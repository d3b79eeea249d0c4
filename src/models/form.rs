//! Form analysis entities
//!
//! The overall shape of a piece: the form label, its sections with their
//! functions, and the auxiliary structures (introduction, coda, transitions,
//! extensions) that frame the periods.

use serde::{Deserialize, Serialize};

/// Overall form labels the classifier can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    OnePart,
    BinaryParallel,
    BinaryRounded,
    TernarySimple,
    TernaryParallel,
    TernaryCompound,
    Sonata,
    Rondo,
    Variation,
    Aaba,
    VerseChorus,
}

/// Role a section plays inside the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Main (A) statement
    Main,
    /// Contrasting middle
    Middle,
    /// Return of the main statement
    Return,
    /// Sonata exposition
    Exposition,
    /// Sonata development
    Development,
    /// Sonata recapitulation
    Recapitulation,
    /// Rondo refrain
    Refrain,
    /// Rondo episode
    Episode,
    /// Variation-set member
    Variation,
    /// Popular-form verse
    Verse,
    /// Popular-form chorus
    Chorus,
    /// AABA bridge
    Bridge,
}

/// Formal function of a section within the whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionFunction {
    Statement,
    Contrast,
    Restatement,
    Development,
    Closing,
}

/// Kind of contrasting middle in a ternary form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddleSectionType {
    Development,
    Trio,
    Episode,
}

/// How closely a variation tracks the theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationKind {
    /// Decorated but clearly recognisable
    Ornamental,
    /// Substantially transformed
    Character,
}

/// How completely a reprise restates the opening section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecapitulationType {
    Complete,
    Varied,
    Partial,
}

/// Named component inside a sonata exposition or recapitulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonataComponent {
    /// Component label ("first theme", "second theme", ...)
    pub label: String,
    /// Index of the backing period
    pub period_index: usize,
    /// Whether the recapitulated statement is varied
    pub varied: bool,
}

/// One section of the overall form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Stable section id
    pub id: String,
    /// Display name ("A", "B", "A'", "Refrain 2", ...)
    pub name: String,
    /// Role inside the form
    pub kind: SectionKind,
    /// First measure
    pub start_measure: u32,
    /// Last measure
    pub end_measure: u32,
    /// Formal function
    pub function: SectionFunction,
    /// Indices of the periods the section spans
    pub periods: Vec<usize>,
    /// Kind of middle section (ternary middles only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_type: Option<MiddleSectionType>,
    /// Components (sonata exposition and recapitulation only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<SonataComponent>>,
    /// Variation kind (variation-set members only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_type: Option<VariationKind>,
    /// Completeness of a reprise (returns and recapitulations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recapitulation: Option<RecapitulationType>,
    /// Whether this section is a recurrence of earlier material (rondo refrains)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recurrence: Option<bool>,
}

/// Inclusive measure span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureSpan {
    /// First measure
    pub start_measure: u32,
    /// Last measure
    pub end_measure: u32,
}

impl MeasureSpan {
    /// Length in measures, inclusive
    pub fn length(&self) -> u32 {
        self.end_measure - self.start_measure + 1
    }
}

/// Closing-gesture classification by span length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodaKind {
    /// More than four measures
    Coda,
    /// Four measures or fewer
    Codetta,
}

/// Closing material after the last period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaInfo {
    /// Measures covered
    pub span: MeasureSpan,
    /// Coda or codetta by length
    pub kind: CodaKind,
}

/// A phrase notably longer than the typical four measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    /// Index of the extended phrase
    pub phrase_index: usize,
    /// Its length in measures
    pub length: u32,
}

/// Framing material around and between the periods
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuxiliaryStructures {
    /// Measures before the first period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<MeasureSpan>,
    /// Measures after the last period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coda: Option<CodaInfo>,
    /// Gaps between consecutive periods
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<MeasureSpan>,
    /// Phrases exceeding 1.5x the typical length
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<ExtensionInfo>,
}

/// Result of the form classification cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalysis {
    /// Winning form label
    pub form_type: FormType,
    /// Sections in score order
    pub sections: Vec<Section>,
    /// Classification confidence in [0, 1]
    pub confidence: f64,
    /// Short human-readable summary
    pub description: String,
}

/// A recurring melodic material across the piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// Base material letter
    pub label: String,
    /// First occurrence
    pub start_measure: u32,
    /// End of the first occurrence
    pub end_measure: u32,
    /// Every span where the material returns
    pub occurrences: Vec<MeasureSpan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&FormType::TernaryCompound).unwrap(),
            "\"ternary_compound\""
        );
        assert_eq!(serde_json::to_string(&FormType::Aaba).unwrap(), "\"aaba\"");
    }

    #[test]
    fn measure_span_length_is_inclusive() {
        let span = MeasureSpan { start_measure: 3, end_measure: 6 };
        assert_eq!(span.length(), 4);
    }
}
