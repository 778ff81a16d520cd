//! Versioned migration steps for the question-options tables.
//!
//! Each step is a pure transformation of a [`QuestionImageBinding`] tagged
//! with the schema version it brings the table to. The database crate runs the
//! pending steps in ascending version order, one transaction per step.

use crate::error::CoreError;
use crate::image_properties::{Center, ImageProperties};
use crate::image_reference::ImageReference;
use crate::types::{DbId, Version};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Image references move to the repository endpoint, view state in the query.
pub const NORMALIZE_IMAGE_URL_VERSION: Version = 2015112400;

/// View state moves out of the URL into `omeroimageproperties`.
pub const STRUCTURED_PROPERTIES_VERSION: Version = 2015121700;

/// `focusablerois` is introduced.
pub const FOCUSABLE_ROIS_VERSION: Version = 2016012101;

/// Time index written by the structured-properties step regardless of input.
pub const LEGACY_T_INDEX: i64 = 1;

/// Z-slice index written by the structured-properties step regardless of input.
pub const LEGACY_Z_INDEX: i64 = 1;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A column a step adds when it is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    /// Type and constraints, as written after the name in `ADD COLUMN`.
    pub definition: &'static str,
}

pub const IMAGE_LOCKED_COLUMN: ColumnDef = ColumnDef {
    name: "omeroimagelocked",
    definition: "INTEGER NOT NULL DEFAULT 0",
};

pub const IMAGE_PROPERTIES_COLUMN: ColumnDef = ColumnDef {
    name: "omeroimageproperties",
    definition: "TEXT NULL DEFAULT NULL",
};

pub const FOCUSABLE_ROIS_COLUMN: ColumnDef = ColumnDef {
    name: "focusablerois",
    definition: "TEXT NOT NULL DEFAULT ''",
};

/// Obsolete column removed by the structured-properties step.
pub const ANSWER_TYPE_COLUMN: &str = "answertype";

/// The image-binding columns a step reads or writes besides `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingColumn {
    ImageUrl,
    ImageLocked,
    ImageProperties,
    FocusableRois,
}

impl BindingColumn {
    /// Column name in the options table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ImageUrl => "omeroimageurl",
            Self::ImageLocked => IMAGE_LOCKED_COLUMN.name,
            Self::ImageProperties => IMAGE_PROPERTIES_COLUMN.name,
            Self::FocusableRois => FOCUSABLE_ROIS_COLUMN.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The image-binding part of one question-options row.
///
/// Optional fields are `None` when the column does not exist yet or was not
/// loaded for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionImageBinding {
    pub id: DbId,
    pub image_url: String,
    pub image_locked: Option<bool>,
    pub image_properties: Option<String>,
    pub focusable_rois: Option<String>,
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One schema upgrade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    NormalizeImageUrl,
    StructuredImageProperties,
    FocusableRois,
}

impl MigrationStep {
    /// Schema version recorded once the step has been applied.
    pub fn version(&self) -> Version {
        match self {
            Self::NormalizeImageUrl => NORMALIZE_IMAGE_URL_VERSION,
            Self::StructuredImageProperties => STRUCTURED_PROPERTIES_VERSION,
            Self::FocusableRois => FOCUSABLE_ROIS_VERSION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NormalizeImageUrl => "normalize_image_url",
            Self::StructuredImageProperties => "structured_image_properties",
            Self::FocusableRois => "focusable_rois",
        }
    }

    /// Columns added (when missing) before rows are rewritten.
    pub fn added_columns(&self) -> &'static [ColumnDef] {
        match self {
            Self::NormalizeImageUrl => &[],
            Self::StructuredImageProperties => &[IMAGE_LOCKED_COLUMN, IMAGE_PROPERTIES_COLUMN],
            Self::FocusableRois => &[FOCUSABLE_ROIS_COLUMN],
        }
    }

    /// Columns dropped (when present) before rows are rewritten.
    pub fn dropped_columns(&self) -> &'static [&'static str] {
        match self {
            Self::StructuredImageProperties => &[ANSWER_TYPE_COLUMN],
            _ => &[],
        }
    }

    /// Columns loaded for each row, besides `id` and `omeroimageurl`.
    pub fn read_columns(&self) -> &'static [BindingColumn] {
        match self {
            Self::StructuredImageProperties => &[BindingColumn::ImageProperties],
            _ => &[],
        }
    }

    /// Columns written back for each row.
    pub fn written_columns(&self) -> &'static [BindingColumn] {
        match self {
            Self::NormalizeImageUrl => &[BindingColumn::ImageUrl],
            Self::StructuredImageProperties => &[
                BindingColumn::ImageUrl,
                BindingColumn::ImageLocked,
                BindingColumn::ImageProperties,
            ],
            Self::FocusableRois => &[BindingColumn::FocusableRois],
        }
    }

    /// Transform one row to the shape this step's version expects.
    pub fn apply(&self, record: QuestionImageBinding) -> Result<QuestionImageBinding, CoreError> {
        match self {
            Self::NormalizeImageUrl => normalize_image_url(record),
            Self::StructuredImageProperties => structured_image_properties(record),
            Self::FocusableRois => Ok(QuestionImageBinding {
                focusable_rois: Some(String::new()),
                ..record
            }),
        }
    }
}

impl std::fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Steps strictly newer than `old_version`, in ascending version order.
pub fn pending_steps(steps: &[MigrationStep], old_version: Version) -> Vec<MigrationStep> {
    let mut pending: Vec<MigrationStep> = steps
        .iter()
        .copied()
        .filter(|step| step.version() > old_version)
        .collect();
    pending.sort_by_key(MigrationStep::version);
    pending
}

fn normalize_image_url(record: QuestionImageBinding) -> Result<QuestionImageBinding, CoreError> {
    let reference = ImageReference::parse(&record.image_url)?;
    Ok(QuestionImageBinding {
        image_url: reference.versioned_url(),
        ..record
    })
}

fn structured_image_properties(
    record: QuestionImageBinding,
) -> Result<QuestionImageBinding, CoreError> {
    let reference = ImageReference::parse(&record.image_url)?;

    let image_properties = match legacy_view_properties(&reference) {
        Some(props) => Some(props.to_json()?),
        None => record.image_properties,
    };

    Ok(QuestionImageBinding {
        image_url: reference.repository_url(),
        image_locked: Some(false),
        image_properties,
        ..record
    })
}

/// Viewer state carried by a legacy query string, if it carried any.
///
/// `t` and `z` are always [`LEGACY_T_INDEX`] / [`LEGACY_Z_INDEX`]; the query
/// values for them are not read.
pub fn legacy_view_properties(reference: &ImageReference) -> Option<ImageProperties> {
    if !reference.has_recognized_params() {
        return None;
    }
    Some(ImageProperties {
        id: reference.image_id,
        center: Center {
            x: reference.float_param("x"),
            y: reference.float_param("y"),
        },
        t: LEGACY_T_INDEX,
        z: LEGACY_Z_INDEX,
        zoom_level: reference.float_param("zm"),
    })
}
