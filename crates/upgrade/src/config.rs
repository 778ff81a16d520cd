use anyhow::Context;
use omero_qtype_core::qtype::QuestionType;

/// Upgrade runner configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local SQLite file.
#[derive(Debug, Clone)]
pub struct UpgradeConfig {
    /// Database URL (default: `sqlite://omero-qtypes.db`).
    pub database_url: String,
    /// Question types to upgrade, in order, parsed from comma-separated `QTYPES`.
    pub question_types: Vec<QuestionType>,
    /// Pool size (default: `1`).
    pub max_connections: u32,
}

impl UpgradeConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var           | Default                               |
    /// |-------------------|---------------------------------------|
    /// | `DATABASE_URL`    | `sqlite://omero-qtypes.db`            |
    /// | `QTYPES`          | `omeromultichoice,omerointeractive`   |
    /// | `MAX_CONNECTIONS` | `1`                                   |
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://omero-qtypes.db".into());

        let question_types = parse_question_types(
            &std::env::var("QTYPES").unwrap_or_else(|_| "omeromultichoice,omerointeractive".into()),
        )?;

        let max_connections: u32 = std::env::var("MAX_CONNECTIONS")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .context("MAX_CONNECTIONS must be a valid u32")?;

        Ok(Self {
            database_url,
            question_types,
            max_connections,
        })
    }
}

/// Parse a comma-separated list of question type names, dropping duplicates.
fn parse_question_types(list: &str) -> anyhow::Result<Vec<QuestionType>> {
    let mut types = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let qtype = QuestionType::from_str(name)
            .with_context(|| format!("invalid QTYPES entry `{name}`"))?;
        if !types.contains(&qtype) {
            types.push(qtype);
        }
    }
    anyhow::ensure!(!types.is_empty(), "QTYPES names no question type");
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_list() {
        let types = parse_question_types("omeromultichoice,omerointeractive").unwrap();
        assert_eq!(types, vec![QuestionType::MultiChoice, QuestionType::Interactive]);
    }

    #[test]
    fn accepts_component_names_and_spaces() {
        let types = parse_question_types(" qtype_omerointeractive , omerointeractive ").unwrap();
        assert_eq!(types, vec![QuestionType::Interactive]);
    }

    #[test]
    fn rejects_unknown_and_empty_lists() {
        assert!(parse_question_types("omeromultichoice,essay").is_err());
        assert!(parse_question_types(" , ").is_err());
    }
}
