#[derive(Debug, thiserror::Error)]
pub enum TrialsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("assessment answers are required")]
    MissingAnswers,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("no clinical trial found with ID: {0}")]
    TrialNotFound(String),
    #[error("assessment not found: {0}")]
    AssessmentNotFound(String),
    #[error("clinical trials registry error: {0}")]
    Upstream(#[from] ctgov::CtGovError),
    #[error("failed to parse question catalogue: {0}")]
    QuestionCatalogue(String),
}

impl TrialsError {
    /// True for errors caused by the caller's input rather than by the service or registry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::MissingAnswers | Self::MissingFields(_)
        )
    }

    /// True for lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TrialNotFound(_) | Self::AssessmentNotFound(_))
    }
}

pub type TrialsResult<T> = std::result::Result<T, TrialsError>;
