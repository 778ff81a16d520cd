//! Parsing of the image references stored in `omeroimageurl`.
//!
//! Historical rows carry a URL-like string such as
//! `/webgateway/render_image/1?id=1&x=0.7&y=0.3&zm=12.5` where the image id is
//! the last path segment, all digits, and the query carries the viewer state
//! (zoom, pan center, time/z-slice indices).

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::types::DbId;

/// Path prefix of the image repository endpoint that references point to.
pub const IMAGE_REPOSITORY_PATH: &str = "/omero-image-repository";

/// Query parameters the legacy viewer understood.
pub const RECOGNIZED_PARAMS: &[&str] = &["id", "x", "y", "zm", "t", "z"];

/// A digit segment ending the path. Matched against the path only, never the
/// query string.
static IMAGE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([0-9]+)$").expect("valid regex"));

/// A parsed legacy image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub image_id: DbId,
    /// Whether the reference carried a `?` at all, even an empty one.
    pub has_query: bool,
    /// Decoded query parameters in order of first appearance.
    pub params: Vec<(String, String)>,
}

impl ImageReference {
    /// Parse a stored reference. Fails when no digit segment precedes the
    /// query string (or the end of the reference).
    pub fn parse(reference: &str) -> Result<Self, CoreError> {
        let without_fragment = reference.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let captures = IMAGE_ID_RE
            .captures(path)
            .ok_or_else(|| CoreError::UnparsableReference(reference.to_string()))?;

        let image_id: DbId = captures[1]
            .parse()
            .map_err(|_| CoreError::UnparsableReference(reference.to_string()))?;

        Ok(Self {
            image_id,
            has_query: query.is_some(),
            params: query.map(parse_query).unwrap_or_default(),
        })
    }

    /// Look up a query parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Read a numeric parameter, `0.0` when absent or not a number.
    pub fn float_param(&self, name: &str) -> f64 {
        self.param(name)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
    }

    /// True when at least one of [`RECOGNIZED_PARAMS`] is present.
    pub fn has_recognized_params(&self) -> bool {
        self.params
            .iter()
            .any(|(key, _)| RECOGNIZED_PARAMS.contains(&key.as_str()))
    }

    /// The bare repository URL, `/omero-image-repository/{id}`.
    pub fn repository_url(&self) -> String {
        repository_url(self.image_id)
    }

    /// The repository URL with the viewer state kept in the query string:
    /// `/omero-image-repository/{id}?id={id}&...`. References without a query
    /// string map to the bare repository URL.
    pub fn versioned_url(&self) -> String {
        if !self.has_query {
            return self.repository_url();
        }

        let mut url = format!("{}?id={}", self.repository_url(), self.image_id);
        for (name, value) in &self.params {
            if name != "id" {
                url.push_str(&format!("&{name}={value}"));
            }
        }
        url
    }
}

/// Build the bare repository URL for an image.
pub fn repository_url(image_id: DbId) -> String {
    format!("{IMAGE_REPOSITORY_PATH}/{image_id}")
}

/// Decode an `application/x-www-form-urlencoded` query. A repeated name keeps
/// its first position and takes the last value.
fn parse_query(query: &str) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if name.is_empty() {
            continue;
        }
        match params.iter_mut().find(|(key, _)| *key == name) {
            Some(existing) => existing.1 = value.into_owned(),
            None => params.push((name.into_owned(), value.into_owned())),
        }
    }
    params
}
