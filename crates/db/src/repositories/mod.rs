pub mod plugin_version_repo;
pub mod question_options_repo;
pub mod schema_repo;
pub mod upgrade_log_repo;

pub use plugin_version_repo::PluginVersionRepo;
pub use question_options_repo::QuestionOptionsRepo;
pub use schema_repo::SchemaRepo;
pub use upgrade_log_repo::UpgradeLogRepo;
