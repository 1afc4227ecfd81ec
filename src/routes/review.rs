use axum::Json;

use crate::dto::exam_dto::ReviewRequest;
use crate::error::Result;
use crate::models::question::Question;
use crate::services::grading_service::{GradingService, ReviewItem};

/// Read-only answer review. Any signed-in role may use it.
#[axum::debug_handler]
pub async fn review(Json(req): Json<ReviewRequest>) -> Result<Json<Vec<ReviewItem>>> {
    let questions = req
        .questions
        .iter()
        .enumerate()
        .map(|(idx, q)| Question::from_raw(q, idx))
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(GradingService::review(&questions, &req.answers)))
}
