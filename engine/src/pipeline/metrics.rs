//! Metric catalog
//!
//! The fixed set of quality criteria a translation is judged against. Each
//! metric carries the criteria text handed to the scoring judge.

use quill_sdk::errors::QuillError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    Fluency,
    Coherence,
    TranslationQuality,
    CulturalAppropriateness,
    ContextualIdiomAccuracy,
    StyleAndTone,
    TerminologyConsistency,
    PreservationOfMainIdea,
    PunctuationAndFormatting,
    EmotionalImpact,
    Localization,
    LexicalChoice,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::Accuracy,
        Metric::Fluency,
        Metric::Coherence,
        Metric::TranslationQuality,
        Metric::CulturalAppropriateness,
        Metric::ContextualIdiomAccuracy,
        Metric::StyleAndTone,
        Metric::TerminologyConsistency,
        Metric::PreservationOfMainIdea,
        Metric::PunctuationAndFormatting,
        Metric::EmotionalImpact,
        Metric::Localization,
        Metric::LexicalChoice,
    ];

    /// Machine name (snake_case), as used in config and on the CLI
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Fluency => "fluency",
            Metric::Coherence => "coherence",
            Metric::TranslationQuality => "translation_quality",
            Metric::CulturalAppropriateness => "cultural_appropriateness",
            Metric::ContextualIdiomAccuracy => "contextual_idiom_accuracy",
            Metric::StyleAndTone => "style_and_tone",
            Metric::TerminologyConsistency => "terminology_consistency",
            Metric::PreservationOfMainIdea => "preservation_of_main_idea",
            Metric::PunctuationAndFormatting => "punctuation_and_formatting",
            Metric::EmotionalImpact => "emotional_impact",
            Metric::Localization => "localization",
            Metric::LexicalChoice => "lexical_choice",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "Accuracy",
            Metric::Fluency => "Fluency",
            Metric::Coherence => "Coherence",
            Metric::TranslationQuality => "Translation Quality",
            Metric::CulturalAppropriateness => "Cultural Appropriateness",
            Metric::ContextualIdiomAccuracy => "Contextual Idiom Accuracy",
            Metric::StyleAndTone => "Style and Tone",
            Metric::TerminologyConsistency => "Terminology Consistency",
            Metric::PreservationOfMainIdea => "Preservation of Main Idea",
            Metric::PunctuationAndFormatting => "Punctuation and Formatting",
            Metric::EmotionalImpact => "Emotional Impact",
            Metric::Localization => "Localization",
            Metric::LexicalChoice => "Lexical Choice",
        }
    }

    /// What the judge should look for
    pub fn criteria(&self) -> &'static str {
        match self {
            Metric::Accuracy => {
                "The translation conveys exactly the facts, claims and offers of the source. \
                 Nothing is added, dropped or distorted."
            }
            Metric::Fluency => {
                "The text reads naturally to a native speaker, with correct grammar \
                 and no awkward or literal phrasing."
            }
            Metric::Coherence => {
                "Ideas follow a logical order and each part of the content connects \
                 clearly to the next."
            }
            Metric::TranslationQuality => {
                "Overall quality of the translation as publishable marketing copy \
                 in the target language."
            }
            Metric::CulturalAppropriateness => {
                "References, imagery and claims suit the target culture and avoid \
                 anything offensive or confusing to that audience."
            }
            Metric::ContextualIdiomAccuracy => {
                "Idioms and figures of speech are rendered with a natural local \
                 equivalent rather than translated word for word."
            }
            Metric::StyleAndTone => {
                "The voice, register and energy of the source are preserved in the \
                 target language."
            }
            Metric::TerminologyConsistency => {
                "Product names, technical terms and key phrases are translated the \
                 same way everywhere they appear."
            }
            Metric::PreservationOfMainIdea => {
                "The core message and call to action of the source remain intact and \
                 equally prominent."
            }
            Metric::PunctuationAndFormatting => {
                "Punctuation, capitalisation, numbers, dates and layout follow the \
                 conventions of the target language."
            }
            Metric::EmotionalImpact => {
                "The translation evokes the same feelings and persuasive pull as the \
                 source content."
            }
            Metric::Localization => {
                "Currencies, units, examples and references are adapted to the \
                 target market where appropriate."
            }
            Metric::LexicalChoice => {
                "Word choice is precise and idiomatic, favouring the terms a local \
                 copywriter would pick."
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = QuillError;

    /// Accepts the snake_case name or the display name, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace([' ', '-'], "_");

        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| QuillError::UnknownMetric(s.trim().to_string()))
    }
}
