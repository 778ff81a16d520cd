pub mod plugin_version;
pub mod question_options;
