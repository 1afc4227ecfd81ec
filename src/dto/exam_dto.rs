use crate::error::{Error, Result};
use crate::models::answer::AnswerInput;
use crate::models::exam::{Exam, ExamSummary, NewExam};
use crate::models::question::{is_valid_type, PresentedQuestion, QuestionKind, RawQuestion};
use crate::services::grading_service::{GradedQuestion, LocalScore};
use crate::utils::multi_select;
use crate::utils::normalize::normalize_answer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    #[validate(length(min = 1, message = "Exam title is required"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(
        min = 1,
        max = 1440,
        message = "Duration must be between 1 and 1440 minutes"
    ))]
    pub duration_minutes: i64,
    #[validate(range(min = 0.0, message = "Passing marks cannot be negative"))]
    pub passing_marks: f64,
    pub branch: Option<String>,
    #[validate(length(min = 1, message = "Add at least one question"))]
    pub questions: Vec<RawQuestion>,
}

impl CreateExamRequest {
    /// Runs every authoring check and returns the exam in platform shape with
    /// canonical type labels.
    pub fn into_new_exam(self) -> Result<NewExam> {
        self.validate()?;
        if self.title.trim().is_empty() {
            return Err(Error::BadRequest("Exam title is required".to_string()));
        }

        let mut questions = Vec::with_capacity(self.questions.len());
        let mut total_marks = 0.0;
        for (idx, q) in self.questions.into_iter().enumerate() {
            let kind = check_question(&q)
                .map_err(|msg| Error::BadRequest(format!("Question {}: {}", idx + 1, msg)))?;
            total_marks += q.marks;
            questions.push(RawQuestion {
                kind: JsonValue::String(kind.as_str().to_string()),
                options: if kind.has_options() { q.options } else { None },
                ..q
            });
        }

        if self.passing_marks > total_marks {
            return Err(Error::BadRequest(format!(
                "Passing marks ({}) exceed the exam total ({})",
                self.passing_marks, total_marks
            )));
        }

        Ok(NewExam {
            title: self.title.trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            duration_minutes: self.duration_minutes,
            passing_marks: self.passing_marks,
            branch: self.branch.filter(|b| !b.trim().is_empty()),
            questions,
        })
    }
}

fn check_question(q: &RawQuestion) -> std::result::Result<QuestionKind, String> {
    if q.text.trim().is_empty() {
        return Err("question text is required".to_string());
    }
    let label = is_valid_type(&q.kind).ok_or("question type is required")?;
    let kind = QuestionKind::from_label(&label)
        .ok_or_else(|| format!("unknown question type '{}'", label))?;
    if !q.marks.is_finite() || q.marks <= 0.0 {
        return Err("marks must be a positive number".to_string());
    }
    if q.correct_answer.trim().is_empty() {
        return Err("correct answer is required".to_string());
    }

    match kind {
        QuestionKind::MultipleChoice | QuestionKind::RadioButton => {
            let options = q.options.as_deref().unwrap_or_default();
            if options.len() < 2 {
                return Err("at least two options are required".to_string());
            }
            if options.iter().any(|o| o.trim().is_empty()) {
                return Err("all options must be filled in".to_string());
            }
            let known: Vec<String> = options.iter().map(|o| normalize_answer(o)).collect();

            if kind == QuestionKind::MultipleChoice {
                let ambiguous = multi_select::ambiguous_options(options);
                if !ambiguous.is_empty() {
                    return Err(format!(
                        "options cannot contain '{}': {}",
                        multi_select::SEPARATOR.trim(),
                        ambiguous.join(", ")
                    ));
                }
                let correct = multi_select::decode(&q.correct_answer);
                if correct.is_empty() {
                    return Err("select at least one correct option".to_string());
                }
                if let Some(missing) = correct
                    .iter()
                    .find(|c| !known.contains(&normalize_answer(c)))
                {
                    return Err(format!("correct answer '{}' is not an option", missing.trim()));
                }
            } else if !known.contains(&normalize_answer(&q.correct_answer)) {
                return Err(format!(
                    "correct answer '{}' is not an option",
                    q.correct_answer.trim()
                ));
            }
        }
        QuestionKind::TrueFalse => {
            let answer = normalize_answer(&q.correct_answer);
            if answer != "true" && answer != "false" {
                return Err("correct answer must be true or false".to_string());
            }
        }
        QuestionKind::ShortAnswer => {}
    }
    Ok(kind)
}

/// Exam as shown to a test taker: summary plus questions without answers.
#[derive(Debug, Clone, Serialize)]
pub struct ExamView {
    #[serde(flatten)]
    pub summary: ExamSummary,
    pub questions: Vec<PresentedQuestion>,
}

impl From<Exam> for ExamView {
    fn from(exam: Exam) -> Self {
        let questions = exam
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| q.present(idx))
            .collect();
        Self {
            summary: exam.summary,
            questions,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub answers: HashMap<String, AnswerInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub earned_marks: f64,
    pub total_marks: f64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    pub correct_count: usize,
    pub questions: Vec<GradedQuestion>,
}

impl From<LocalScore> for ScoreResponse {
    fn from(score: LocalScore) -> Self {
        Self {
            earned_marks: score.earned_marks,
            total_marks: score.total_marks,
            percentage: score.percentage_f64(),
            passed: score.passed,
            correct_count: score.correct_count,
            questions: score.items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAnswerRequest {
    pub question_id: String,
    pub answer: AnswerInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub questions: Vec<RawQuestion>,
    #[serde(default)]
    pub answers: HashMap<String, AnswerInput>,
}
