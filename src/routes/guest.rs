use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::dto::exam_dto::{CreateExamRequest, ExamView, ScoreRequest, ScoreResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::CurrentSession;
use crate::models::exam::{ExamSummary, NewExam};
use crate::models::question::Question;
use crate::models::session::Session;
use crate::services::grading_service::{percentage_of, GradingService};
use crate::AppState;

fn guest_code(session: &Session) -> Result<&str> {
    session
        .guest_code()
        .ok_or_else(|| Error::Forbidden("Guest code required".to_string()))
}

#[axum::debug_handler]
pub async fn get_exam(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamView>> {
    let exam = state
        .platform
        .get_guest_exam(guest_code(&session)?, &exam_id)
        .await?;
    Ok(Json(exam.into()))
}

/// Demo exams are scored here; the platform never sees guest answers.
#[axum::debug_handler]
pub async fn score_exam(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>> {
    let exam = state
        .platform
        .get_guest_exam(guest_code(&session)?, &exam_id)
        .await?;
    let questions = exam
        .questions
        .iter()
        .enumerate()
        .map(|(idx, q)| Question::from_raw(q, idx))
        .collect::<Result<Vec<_>>>()?;

    let passing = (exam.summary.passing_marks > 0.0)
        .then(|| percentage_of(exam.summary.passing_marks, exam.total_marks()));
    let score = GradingService::grade_locally(&questions, &req.answers, passing);
    tracing::info!(
        session_id = %session.id,
        exam_id = %exam_id,
        percentage = %score.percentage,
        "Guest exam scored"
    );
    Ok(Json(score.into()))
}

#[axum::debug_handler]
pub async fn create_exam(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(req): Json<CreateExamRequest>,
) -> Result<Json<ExamSummary>> {
    let exam: NewExam = req.into_new_exam()?;
    let created = state
        .platform
        .create_guest_exam(guest_code(&session)?, &exam)
        .await?;
    tracing::info!(session_id = %session.id, exam_id = %created.id, "Guest exam created");
    Ok(Json(created))
}
