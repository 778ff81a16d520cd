#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unable to detect the image id in reference: {0}")]
    UnparsableReference(String),

    #[error("Unknown question type: {0}")]
    UnknownQuestionType(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
