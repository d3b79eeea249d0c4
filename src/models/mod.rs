//! Data contracts of the analysis engine
//!
//! Everything the engine exchanges with its collaborators: the parsed score
//! it consumes, the structural entities it emits, and the visual-scheme
//! contract the recommender speaks.

pub mod audio;
pub mod form;
pub mod note;
pub mod score;
pub mod structure;
pub mod visual;

pub use audio::{AudioFeatures, AudioSummary};
pub use form::{
    AuxiliaryStructures, CodaInfo, CodaKind, ExtensionInfo, FormAnalysis, FormType, MeasureSpan,
    MiddleSectionType, RecapitulationType, Section, SectionFunction, SectionKind, SonataComponent,
    Theme, VariationKind,
};
pub use note::{Accidental, DynamicMark, Note, PitchName, Step};
pub use score::{KeyMode, KeySignature, Measure, ParsedScore, Part, TimeSignature};
pub use structure::{
    cadence_strength, Cadence, CadenceStrength, CadenceType, Closure, Contour, Motive,
    MotiveRelationship, Period, PeriodType, Phrase, PhraseRelationship, Proportion, SubPhrase,
};
pub use visual::{
    AnimationType, Arrangement, DynamicsClass, EmotionFeatures, RecommendationSource,
    SchemeRelationship, ShapeSize, ShapeSpec, ShapeType, TempoClass, TensionClass, VisualScheme,
};
