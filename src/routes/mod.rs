pub mod auth;
pub mod guest;
pub mod health;
pub mod institute;
pub mod review;
pub mod sample;
pub mod student;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::middleware::auth::{require_guest, require_institute, require_session, require_student};
use crate::AppState;

/// CSV uploads larger than this are rejected before parsing.
const UPLOAD_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Every API route grouped by the role its guard admits.
pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/student/login", post(auth::student_login))
        .route("/api/auth/institute/login", post(auth::institute_login))
        .route("/api/auth/guest", post(auth::guest_login))
        .route("/api/sample/questions", get(sample::sample_questions))
        .route("/api/sample/score", post(sample::score_sample));

    let session_api = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/flags", post(auth::set_flag))
        .route("/api/review", post(review::review))
        .layer(from_fn_with_state(state.clone(), require_session));

    let guest_api = Router::new()
        .route("/api/guest/exams", post(guest::create_exam))
        .route("/api/guest/exams/:id", get(guest::get_exam))
        .route("/api/guest/exams/:id/score", post(guest::score_exam))
        .layer(from_fn_with_state(state.clone(), require_guest));

    let student_api = Router::new()
        .route("/api/student/exams", get(student::list_exams))
        .route("/api/student/exams/:id", get(student::get_exam))
        .route("/api/student/exams/:id/start", post(student::start_exam))
        .route("/api/student/exams/:id/attempt", get(student::get_attempt))
        .route("/api/student/exams/:id/answer", patch(student::save_answer))
        .route("/api/student/exams/:id/submit", post(student::submit_exam))
        .route("/api/student/results", get(student::list_results))
        .layer(from_fn_with_state(state.clone(), require_student));

    let institute_api = Router::new()
        .route(
            "/api/institute/exams",
            get(institute::list_exams).post(institute::create_exam),
        )
        .route(
            "/api/institute/questions/import",
            post(institute::import_questions),
        )
        .route(
            "/api/institute/students/import",
            post(institute::import_students),
        )
        .route(
            "/api/institute/exams/:id/results",
            get(institute::exam_results),
        )
        .route(
            "/api/institute/exams/:id/results/export",
            get(institute::export_results),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(from_fn_with_state(state.clone(), require_institute));

    Router::new()
        .merge(public_api)
        .merge(session_api)
        .merge(guest_api)
        .merge(student_api)
        .merge(institute_api)
        .with_state(state)
}
