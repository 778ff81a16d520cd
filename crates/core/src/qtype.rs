//! The question types and their per-type schema history.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::migration::MigrationStep;
use crate::types::Version;

/// A question type plugin backed by its own options table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// ROI-anchored multiple choice.
    #[serde(rename = "omeromultichoice")]
    MultiChoice,
    /// ROI-anchored interactive question.
    #[serde(rename = "omerointeractive")]
    Interactive,
}

impl QuestionType {
    /// All question types, in install order.
    pub const ALL: &'static [QuestionType] = &[Self::MultiChoice, Self::Interactive];

    /// Short plugin name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultiChoice => "omeromultichoice",
            Self::Interactive => "omerointeractive",
        }
    }

    /// Parse a short plugin name (with or without the `qtype_` prefix).
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s.trim().trim_start_matches("qtype_") {
            "omeromultichoice" => Ok(Self::MultiChoice),
            "omerointeractive" => Ok(Self::Interactive),
            other => Err(CoreError::UnknownQuestionType(other.to_string())),
        }
    }

    /// Full component name under which the schema version is recorded.
    pub fn component(&self) -> &'static str {
        match self {
            Self::MultiChoice => "qtype_omeromultichoice",
            Self::Interactive => "qtype_omerointeractive",
        }
    }

    /// Table holding the per-question options.
    pub fn options_table(&self) -> &'static str {
        match self {
            Self::MultiChoice => "qtype_omemultichoice_options",
            Self::Interactive => "qtype_omeinteractive_options",
        }
    }

    /// Upgrade steps this type has gone through, oldest first.
    pub fn steps(&self) -> &'static [MigrationStep] {
        match self {
            Self::MultiChoice => &[
                MigrationStep::NormalizeImageUrl,
                MigrationStep::StructuredImageProperties,
                MigrationStep::FocusableRois,
            ],
            Self::Interactive => &[
                MigrationStep::NormalizeImageUrl,
                MigrationStep::FocusableRois,
            ],
        }
    }

    /// Schema version of a freshly installed table.
    pub fn current_version(&self) -> Version {
        self.steps()
            .iter()
            .map(MigrationStep::version)
            .max()
            .unwrap_or_default()
    }

    /// Whether rows of this type carry the lock flag and structured properties.
    pub fn has_image_properties(&self) -> bool {
        self.steps()
            .contains(&MigrationStep::StructuredImageProperties)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
