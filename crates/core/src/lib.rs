//! Pure domain logic for the OMERO question types: legacy image reference
//! parsing, versioned migration steps, the authoring form model and the image
//! viewer configuration. No database, no async, no I/O.

pub mod error;
pub mod form;
pub mod image_properties;
pub mod image_reference;
pub mod migration;
pub mod qtype;
pub mod types;
pub mod viewer;
