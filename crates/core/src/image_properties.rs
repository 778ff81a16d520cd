//! Structured viewer state stored in `omeroimageproperties`.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Pan center of the viewer, in image-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Center {
    pub x: f64,
    pub y: f64,
}

/// Image id plus the viewer state a question opens with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProperties {
    pub id: DbId,
    pub center: Center,
    pub t: i64,
    pub z: i64,
    pub zoom_level: f64,
}

impl ImageProperties {
    /// Encode as the JSON text persisted in the options table.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the JSON text persisted in the options table.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
