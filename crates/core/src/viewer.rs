//! Configuration handed to the client-side image viewer widget, plus the
//! helpers that name the per-ROI "jump to" controls it renders.

use serde::Serialize;

use crate::image_properties::ImageProperties;
use crate::types::DbId;

/// Control key of the "jump to ROI" marker buttons.
pub const GOTO_CONTROL: &str = "goto_marker_ctrl_id";

/// Everything the question player needs to open an image and show its ROIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageViewerConfig {
    pub image_id: DbId,
    pub image_properties: Option<ImageProperties>,
    /// Base URL of the image server the viewer talks to.
    pub image_server: String,
    pub image_viewer_container: String,
    pub image_annotations_canvas_id: String,
    pub focusable_rois: Vec<String>,
    /// Input name of the answer field, e.g. `q12:1_answer`.
    pub answer_input_name: String,
    pub focus_areas_container: String,
}

impl ImageViewerConfig {
    /// Serialize for the widget's init call.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// DOM id of the "jump to" button for one ROI.
    pub fn goto_button_id(&self, roi: &str) -> String {
        format!(
            "{}{roi}_btn",
            control_id(&self.answer_input_name, GOTO_CONTROL)
        )
    }

    /// DOM id of the container wrapping one ROI's marker.
    pub fn marker_container_id(&self, roi: &str) -> String {
        format!(
            "{}{roi}_container",
            control_id(&self.answer_input_name, GOTO_CONTROL)
        )
    }
}

/// DOM id of a control that belongs to one answer input. The first `:` of the
/// input name is not valid in an id and becomes `-`.
pub fn control_id(answer_input_name: &str, control: &str) -> String {
    format!("{}-{control}", answer_input_name.replacen(':', "-", 1))
}

/// Human label for a ROI id: the first `_` becomes a space and the first
/// character is upper-cased (`roi_12` -> `Roi 12`).
pub fn focus_area_label(roi: &str) -> String {
    let spaced = roi.replacen('_', " ", 1);
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split the stored `focusablerois` value into ROI ids.
pub fn parse_focusable_rois(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|roi| !roi.is_empty())
        .map(String::from)
        .collect()
}

/// Join ROI ids into the stored `focusablerois` value.
pub fn format_focusable_rois<S: AsRef<str>>(rois: &[S]) -> String {
    rois.iter()
        .map(|roi| roi.as_ref().trim())
        .filter(|roi| !roi.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
