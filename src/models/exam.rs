use crate::models::question::RawQuestion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default)]
    pub total_marks: f64,
    #[serde(default)]
    pub passing_marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    #[serde(flatten)]
    pub summary: ExamSummary,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

impl Exam {
    pub fn total_marks(&self) -> f64 {
        if self.summary.total_marks > 0.0 {
            self.summary.total_marks
        } else {
            self.questions.iter().map(|q| q.marks).sum()
        }
    }
}

/// Authoritative result computed by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub exam_id: Option<String>,
    #[serde(default)]
    pub exam_title: Option<String>,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_email: String,
    pub score: f64,
    pub total_marks: f64,
    pub passed: bool,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub score: f64,
    pub total_marks: f64,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Exam authored by an institute or a guest, as sent to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub passing_marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub questions: Vec<RawQuestion>,
}
