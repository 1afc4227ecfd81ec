use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use bytes::Bytes;
use serde::Serialize;

use crate::dto::exam_dto::CreateExamRequest;
use crate::error::{Error, Result};
use crate::middleware::auth::CurrentSession;
use crate::models::exam::{ExamResult, ExamSummary};
use crate::models::session::Session;
use crate::models::student::{NewStudent, RowReport};
use crate::services::export_service::ExportService;
use crate::services::import_service::{ImportService, QuestionImport};
use crate::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Serialize)]
pub struct StudentImportReport {
    pub created: usize,
    pub rows: Vec<RowReport>,
}

fn bearer(session: &Session) -> Result<&str> {
    session
        .bearer_token()
        .ok_or_else(|| Error::Forbidden("Sign in as an institute".to_string()))
}

/// Text of the `file` part of a CSV upload.
async fn read_csv_upload(mut multipart: Multipart) -> Result<String> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let data: Bytes = field.bytes().await?;
        let text = String::from_utf8(data.to_vec())
            .map_err(|_| Error::BadRequest("CSV file must be UTF-8 encoded".to_string()))?;
        return Ok(text.trim_start_matches('\u{feff}').to_string());
    }
    Err(Error::BadRequest("Missing 'file' field".to_string()))
}

#[axum::debug_handler]
pub async fn list_exams(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<Vec<ExamSummary>>> {
    Ok(Json(state.platform.list_institute_exams(bearer(&session)?).await?))
}

#[axum::debug_handler]
pub async fn create_exam(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(req): Json<CreateExamRequest>,
) -> crate::error::Result<Response> {
    let exam = req.into_new_exam()?;
    let created = state.platform.create_exam(bearer(&session)?, &exam).await?;
    tracing::info!(
        session_id = %session.id,
        exam_id = %created.id,
        questions = exam.questions.len(),
        "Exam created"
    );
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

#[axum::debug_handler]
pub async fn import_questions(multipart: Multipart) -> Result<Json<QuestionImport>> {
    let text = read_csv_upload(multipart).await?;
    let import = ImportService::parse_questions_csv(&text);
    if import.questions.is_empty() {
        return Err(Error::BadRequest(
            "No complete question rows found in the CSV".to_string(),
        ));
    }
    Ok(Json(import))
}

#[axum::debug_handler]
pub async fn import_students(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    multipart: Multipart,
) -> Result<Json<StudentImportReport>> {
    let text = read_csv_upload(multipart).await?;
    let import = ImportService::parse_students_csv(&text);

    let mut rows = import.skipped;
    let mut created = 0;
    if !import.rows.is_empty() {
        let students: Vec<NewStudent> = import.rows.iter().map(NewStudent::from).collect();
        let response = state
            .platform
            .bulk_create_students(bearer(&session)?, &students)
            .await?;
        created = response.created;
        rows.extend(ImportService::attach_upload_errors(&import.rows, &response.errors));
    }
    rows.sort_by_key(|r| r.line_no);

    tracing::info!(
        session_id = %session.id,
        created,
        reported = rows.len(),
        "Student roster uploaded"
    );
    Ok(Json(StudentImportReport { created, rows }))
}

#[axum::debug_handler]
pub async fn exam_results(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
) -> Result<Json<Vec<ExamResult>>> {
    Ok(Json(
        state
            .platform
            .exam_results(bearer(&session)?, &exam_id)
            .await?,
    ))
}

#[axum::debug_handler]
pub async fn export_results(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(exam_id): Path<String>,
) -> crate::error::Result<Response> {
    let token = bearer(&session)?;
    let results = state.platform.exam_results(token, &exam_id).await?;
    let title = results
        .iter()
        .find_map(|r| r.exam_title.clone())
        .unwrap_or_else(|| format!("Exam {}", exam_id));

    let buffer = ExportService::generate_results_xlsx(&title, &results)?;
    let filename = format!(
        "results_{}_{}.xlsx",
        exam_id.replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
        chrono::Utc::now().format("%Y%m%d")
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
        .into_response())
}
