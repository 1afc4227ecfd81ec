use crate::models::question::QuestionKind;
use crate::utils::multi_select;
use crate::utils::normalize::{is_blank, normalize_answer};
use serde::{Deserialize, Serialize};

/// Answer value as posted by the UI: either the platform string encoding,
/// a list of selected options, or a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerInput {
    Flag(bool),
    Many(Vec<String>),
    One(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Choices(Vec<String>),
    Choice(String),
    Bool(bool),
    Text(String),
}

impl Answer {
    pub fn from_input(kind: QuestionKind, input: &AnswerInput) -> Answer {
        match (kind, input) {
            (QuestionKind::MultipleChoice, AnswerInput::Many(items)) => Answer::Choices(
                items
                    .iter()
                    .filter(|s| !s.trim().is_empty())
                    .cloned()
                    .collect(),
            ),
            (QuestionKind::MultipleChoice, AnswerInput::One(s)) => {
                Answer::Choices(multi_select::decode(s))
            }
            (QuestionKind::RadioButton, AnswerInput::One(s)) => Answer::Choice(s.clone()),
            (QuestionKind::RadioButton, AnswerInput::Many(items)) => {
                Answer::Choice(items.first().cloned().unwrap_or_default())
            }
            (QuestionKind::TrueFalse, AnswerInput::Flag(b)) => Answer::Bool(*b),
            (QuestionKind::TrueFalse, AnswerInput::One(s)) => {
                match normalize_answer(s).as_str() {
                    "true" => Answer::Bool(true),
                    "false" => Answer::Bool(false),
                    _ => Answer::Text(s.clone()),
                }
            }
            (_, AnswerInput::Flag(b)) => Answer::Text(b.to_string()),
            (_, AnswerInput::One(s)) => Answer::Text(s.clone()),
            (_, AnswerInput::Many(items)) => Answer::Text(multi_select::encode(items)),
        }
    }

    /// Platform string encoding of the answer.
    pub fn to_wire(&self) -> String {
        match self {
            Answer::Choices(items) => multi_select::encode(items),
            Answer::Choice(s) | Answer::Text(s) => s.clone(),
            Answer::Bool(b) => b.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Choices(items) => items.iter().all(|s| is_blank(s)),
            Answer::Choice(s) | Answer::Text(s) => is_blank(s),
            Answer::Bool(_) => false,
        }
    }
}
