use axum::Json;

use crate::dto::exam_dto::{ScoreRequest, ScoreResponse};
use crate::models::question::PresentedQuestion;
use crate::services::grading_service::GradingService;
use crate::services::sample_service::{SampleService, SAMPLE_PASSING_PERCENTAGE};

#[axum::debug_handler]
pub async fn sample_questions() -> Json<Vec<PresentedQuestion>> {
    Json(SampleService::presented())
}

#[axum::debug_handler]
pub async fn score_sample(Json(req): Json<ScoreRequest>) -> Json<ScoreResponse> {
    let score = GradingService::grade_locally(
        SampleService::questions(),
        &req.answers,
        Some(SAMPLE_PASSING_PERCENTAGE),
    );
    tracing::info!(
        percentage = %score.percentage,
        correct = score.correct_count,
        "Sample test scored"
    );
    Json(score.into())
}
