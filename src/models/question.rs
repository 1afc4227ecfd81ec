use crate::error::{Error, Result};
use crate::utils::multi_select;
use crate::utils::normalize::normalize_answer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    MultipleChoice,
    RadioButton,
    TrueFalse,
    ShortAnswer,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 4] = [
        QuestionKind::MultipleChoice,
        QuestionKind::RadioButton,
        QuestionKind::TrueFalse,
        QuestionKind::ShortAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiplechoice",
            QuestionKind::RadioButton => "radiobutton",
            QuestionKind::TrueFalse => "truefalse",
            QuestionKind::ShortAnswer => "shortanswer",
        }
    }

    /// Resolves a raw label to a canonical kind.
    ///
    /// The label is only trimmed and lowercased before matching, so
    /// `"Multiple Choice"` does not resolve while `"MultipleChoice"` does.
    pub fn from_label(label: &str) -> Option<QuestionKind> {
        let normalized = normalize_answer(label);
        QuestionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Kind used to pick an input widget. Unknown labels render as free text.
    pub fn for_rendering(label: &JsonValue) -> QuestionKind {
        is_valid_type(label)
            .and_then(|normalized| QuestionKind::from_label(&normalized))
            .unwrap_or(QuestionKind::ShortAnswer)
    }

    pub fn has_options(&self) -> bool {
        matches!(self, QuestionKind::MultipleChoice | QuestionKind::RadioButton)
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized form of a type label, or `None` when the label is not a string.
pub fn is_valid_type(label: &JsonValue) -> Option<String> {
    label.as_str().map(normalize_answer)
}

/// Question as exchanged with the exam platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "questionText")]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub marks: f64,
}

impl RawQuestion {
    /// Stable identifier: the platform id when present, otherwise the 1-based position.
    pub fn id_or_position(&self, idx: usize) -> String {
        self.id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| (idx + 1).to_string())
    }

    /// Shape sent to a test taker: no correct answer, canonical kind only.
    pub fn present(&self, idx: usize) -> PresentedQuestion {
        let kind = QuestionKind::for_rendering(&self.kind);
        PresentedQuestion {
            id: self.id_or_position(idx),
            text: self.text.clone(),
            kind,
            options: if kind.has_options() {
                self.options.clone().unwrap_or_default()
            } else {
                Vec::new()
            },
            marks: self.marks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedQuestion {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<String>,
    pub marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub marks: f64,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionDetails {
    MultipleChoice {
        options: Vec<String>,
        correct: Vec<String>,
    },
    RadioButton {
        options: Vec<String>,
        correct: String,
    },
    TrueFalse {
        correct: bool,
    },
    ShortAnswer {
        correct: String,
    },
}

impl Question {
    pub fn from_raw(raw: &RawQuestion, idx: usize) -> Result<Question> {
        let id = raw.id_or_position(idx);
        let kind = QuestionKind::for_rendering(&raw.kind);
        if raw.correct_answer.trim().is_empty() {
            return Err(Error::BadRequest(format!(
                "Question {} has no correct answer",
                id
            )));
        }

        let options = || raw.options.clone().unwrap_or_default();
        let details = match kind {
            QuestionKind::MultipleChoice => QuestionDetails::MultipleChoice {
                options: options(),
                correct: multi_select::decode(&raw.correct_answer),
            },
            QuestionKind::RadioButton => QuestionDetails::RadioButton {
                options: options(),
                correct: raw.correct_answer.trim().to_string(),
            },
            QuestionKind::TrueFalse => match normalize_answer(&raw.correct_answer).as_str() {
                "true" => QuestionDetails::TrueFalse { correct: true },
                "false" => QuestionDetails::TrueFalse { correct: false },
                other => {
                    return Err(Error::BadRequest(format!(
                        "Question {} is true/false but its answer is '{}'",
                        id, other
                    )))
                }
            },
            QuestionKind::ShortAnswer => QuestionDetails::ShortAnswer {
                correct: raw.correct_answer.trim().to_string(),
            },
        };

        Ok(Question {
            id,
            text: raw.text.clone(),
            marks: raw.marks,
            details,
        })
    }

    pub fn kind(&self) -> QuestionKind {
        match self.details {
            QuestionDetails::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionDetails::RadioButton { .. } => QuestionKind::RadioButton,
            QuestionDetails::TrueFalse { .. } => QuestionKind::TrueFalse,
            QuestionDetails::ShortAnswer { .. } => QuestionKind::ShortAnswer,
        }
    }

    pub fn options(&self) -> &[String] {
        match &self.details {
            QuestionDetails::MultipleChoice { options, .. }
            | QuestionDetails::RadioButton { options, .. } => options.as_slice(),
            _ => &[],
        }
    }

    /// Correct answer in the platform's string encoding.
    pub fn correct_answer_wire(&self) -> String {
        match &self.details {
            QuestionDetails::MultipleChoice { correct, .. } => multi_select::encode(correct),
            QuestionDetails::RadioButton { correct, .. }
            | QuestionDetails::ShortAnswer { correct } => correct.clone(),
            QuestionDetails::TrueFalse { correct } => correct.to_string(),
        }
    }

    pub fn to_raw(&self) -> RawQuestion {
        RawQuestion {
            id: Some(self.id.clone()),
            text: self.text.clone(),
            kind: JsonValue::String(self.kind().as_str().to_string()),
            options: self.kind().has_options().then(|| self.options().to_vec()),
            correct_answer: self.correct_answer_wire(),
            marks: self.marks,
        }
    }
}
