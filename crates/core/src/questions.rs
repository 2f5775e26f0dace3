//! The eligibility questionnaire.
//!
//! Questions are embedded as YAML and parsed once when the service starts. Each question's
//! `field` must name an answer the scoring engine understands.

use crate::answers::AnswerField;
use crate::{TrialsError, TrialsResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

const EMBEDDED: &str = include_str!("../questions/eligibility.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Number,
    Select,
    Multiselect,
    Text,
}

/// Numeric bounds for a number question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Question {
    pub id: u32,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub field: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<NumberRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Ordered, validated list of questions.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionCatalogue {
    questions: Vec<Question>,
}

impl QuestionCatalogue {
    /// The questionnaire compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::QuestionCatalogue`] if the embedded YAML is invalid.
    pub fn embedded() -> TrialsResult<Self> {
        Self::from_yaml(EMBEDDED)
    }

    /// Parses and validates a questionnaire document.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::QuestionCatalogue`] when the YAML does not match the question
    /// shape (naming the failing path), when two questions share an ID, when a field is not a
    /// recognised answer, or when a choice question has no options.
    pub fn from_yaml(yaml: &str) -> TrialsResult<Self> {
        let de = serde_yaml::Deserializer::from_str(yaml);
        let questions: Vec<Question> = serde_path_to_error::deserialize(de).map_err(|e| {
            let path = e.path().to_string();
            let path = if path.is_empty() { "<root>".into() } else { path };
            TrialsError::QuestionCatalogue(format!("{path}: {}", e.inner()))
        })?;

        let mut ids = HashSet::new();
        for q in &questions {
            if !ids.insert(q.id) {
                return Err(TrialsError::QuestionCatalogue(format!(
                    "duplicate question id {}",
                    q.id
                )));
            }
            if AnswerField::from_key(&q.field).is_none() {
                return Err(TrialsError::QuestionCatalogue(format!(
                    "question {} uses unknown field '{}'",
                    q.id, q.field
                )));
            }
            let is_choice = matches!(q.kind, QuestionType::Select | QuestionType::Multiselect);
            if is_choice && q.options.is_empty() {
                return Err(TrialsError::QuestionCatalogue(format!(
                    "question {} has no options",
                    q.id
                )));
            }
        }

        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}
