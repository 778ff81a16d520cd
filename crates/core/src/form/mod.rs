//! Authoring form model.
//!
//! Describes the fields of the question editing form independently of any
//! rendering framework: fixed fields, groups repeated N times with their names
//! suffixed by the group index, and the submission checks.

pub mod field;
pub mod multichoice;
pub mod repeat;
pub mod validation;
