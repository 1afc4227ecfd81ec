use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::dto::exam_dto::{ExamView, SaveAnswerRequest};
use crate::error::{Error, Result};
use crate::middleware::auth::CurrentSession;
use crate::models::exam::{ExamResult, ExamSummary, SubmissionReceipt};
use crate::models::session::Session;
use crate::services::attempt_service::{AttemptStatus, AttemptView};
use crate::AppState;

fn bearer(session: &Session) -> Result<&str> {
    session
        .bearer_token()
        .ok_or_else(|| Error::Forbidden("Sign in as a student".to_string()))
}

#[axum::debug_handler]
pub async fn list_exams(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<Vec<ExamSummary>>> {
    Ok(Json(state.platform.list_student_exams(bearer(&session)?).await?))
}

#[axum::debug_handler]
pub async fn get_exam(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamView>> {
    let exam = state
        .platform
        .get_student_exam(bearer(&session)?, &exam_id)
        .await?;
    Ok(Json(exam.into()))
}

#[axum::debug_handler]
pub async fn start_exam(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
) -> Result<Json<AttemptView>> {
    // A running attempt keeps its deadline; no need to refetch the exam.
    if let Ok(view) = state.attempts.view(session.id, &exam_id) {
        if view.status == AttemptStatus::Submitted {
            return Err(Error::Conflict(
                "This exam has already been submitted".to_string(),
            ));
        }
        return Ok(Json(view));
    }
    let exam = state
        .platform
        .get_student_exam(bearer(&session)?, &exam_id)
        .await?;
    Ok(Json(state.attempts.start(&session, &exam)?))
}

#[axum::debug_handler]
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
) -> Result<Json<AttemptView>> {
    Ok(Json(state.attempts.view(session.id, &exam_id)?))
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
    Json(req): Json<SaveAnswerRequest>,
) -> Result<Json<AttemptView>> {
    Ok(Json(state.attempts.save_answer(
        session.id,
        &exam_id,
        &req.question_id,
        &req.answer,
    )?))
}

#[axum::debug_handler]
pub async fn submit_exam(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
) -> Result<Json<SubmissionReceipt>> {
    Ok(Json(state.attempts.submit(session.id, &exam_id).await?))
}

#[axum::debug_handler]
pub async fn list_results(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<Vec<ExamResult>>> {
    Ok(Json(state.platform.list_student_results(bearer(&session)?).await?))
}
