//! Question options models for the `qtype_ome*_options` tables.
//!
//! Both question types share the row layout; only the multiple-choice table
//! carries `omeroimagelocked` and `omeroimageproperties`.

use omero_qtype_core::error::CoreError;
use omero_qtype_core::image_properties::ImageProperties;
use omero_qtype_core::image_reference::ImageReference;
use omero_qtype_core::types::DbId;
use omero_qtype_core::viewer::{parse_focusable_rois, ImageViewerConfig};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from one of the question options tables, at the current schema.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuestionOptions {
    pub id: DbId,
    #[sqlx(rename = "questionid")]
    pub question_id: DbId,
    pub single: bool,
    #[sqlx(rename = "shuffleanswers")]
    pub shuffle_answers: bool,
    #[sqlx(rename = "answernumbering")]
    pub answer_numbering: String,
    #[sqlx(rename = "correctfeedback")]
    pub correct_feedback: String,
    #[sqlx(rename = "partiallycorrectfeedback")]
    pub partially_correct_feedback: String,
    #[sqlx(rename = "incorrectfeedback")]
    pub incorrect_feedback: String,
    #[sqlx(rename = "shownumcorrect")]
    pub show_num_correct: bool,
    #[sqlx(rename = "omeroimageurl")]
    pub image_url: String,
    #[sqlx(rename = "omeroimagelocked", default)]
    pub image_locked: Option<bool>,
    #[sqlx(rename = "omeroimageproperties", default)]
    pub image_properties: Option<String>,
    #[sqlx(rename = "focusablerois")]
    pub focusable_rois: String,
}

impl QuestionOptions {
    /// Decoded `omeroimageproperties`, if set.
    pub fn decoded_image_properties(&self) -> Result<Option<ImageProperties>, CoreError> {
        self.image_properties
            .as_deref()
            .map(ImageProperties::from_json)
            .transpose()
            .map_err(CoreError::from)
    }

    /// Build the image viewer configuration for this question.
    pub fn viewer_config(
        &self,
        image_server: &str,
        answer_input_name: &str,
    ) -> Result<ImageViewerConfig, CoreError> {
        let reference = ImageReference::parse(&self.image_url)?;
        let prefix = answer_input_name.replacen(':', "-", 1);
        Ok(ImageViewerConfig {
            image_id: reference.image_id,
            image_properties: self.decoded_image_properties()?,
            image_server: image_server.to_string(),
            image_viewer_container: format!("{prefix}-image-viewer"),
            image_annotations_canvas_id: format!("{prefix}-annotations-canvas"),
            focusable_rois: parse_focusable_rois(&self.focusable_rois),
            answer_input_name: answer_input_name.to_string(),
            focus_areas_container: format!("{prefix}-focus-areas"),
        })
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for saving the options of a newly authored question.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionOptions {
    pub question_id: DbId,
    pub single: bool,
    pub shuffle_answers: bool,
    pub answer_numbering: String,
    #[serde(default)]
    pub correct_feedback: String,
    #[serde(default)]
    pub partially_correct_feedback: String,
    #[serde(default)]
    pub incorrect_feedback: String,
    #[serde(default)]
    pub show_num_correct: bool,
    pub image_id: DbId,
    #[serde(default)]
    pub image_locked: bool,
    pub image_properties: Option<ImageProperties>,
    #[serde(default)]
    pub focusable_rois: Vec<String>,
}
