use crate::error::{Error, Result};
use crate::models::answer::{Answer, AnswerInput};
use crate::models::exam::{Exam, SubmissionReceipt, SubmittedAnswer};
use crate::models::question::QuestionKind;
use crate::models::session::Session;
use crate::services::platform_client::PlatformApi;
use crate::utils::time::seconds_until;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type AttemptKey = (Uuid, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitting,
    Submitted,
}

struct Attempt {
    bearer_token: String,
    question_order: Vec<String>,
    kinds: HashMap<String, QuestionKind>,
    drafts: HashMap<String, String>,
    deadline: Option<DateTime<Utc>>,
    /// Same instant as `deadline` on the runtime clock that drives the countdown.
    closes_at: Option<Instant>,
    status: AttemptStatus,
    cancel: CancellationToken,
    receipt: Option<SubmissionReceipt>,
}

impl Attempt {
    fn view(&self, exam_id: &str) -> AttemptView {
        AttemptView {
            exam_id: exam_id.to_string(),
            status: self.status,
            deadline: self.deadline,
            seconds_remaining: self.deadline.map(seconds_until),
            answered: self.drafts.len(),
            total_questions: self.question_order.len(),
            receipt: self.receipt.clone(),
        }
    }

    fn submitted_answers(&self) -> Vec<SubmittedAnswer> {
        self.question_order
            .iter()
            .map(|id| SubmittedAnswer {
                question_id: id.clone(),
                answer: self.drafts.get(id).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptView {
    pub exam_id: String,
    pub status: AttemptStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub seconds_remaining: Option<i64>,
    pub answered: usize,
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
}

/// Registered-student exam attempts: draft answers, the countdown that submits
/// at zero, and the single submission to the platform.
#[derive(Clone)]
pub struct AttemptService {
    attempts: Arc<Mutex<HashMap<AttemptKey, Attempt>>>,
    platform: Arc<dyn PlatformApi>,
}

impl AttemptService {
    pub fn new(platform: Arc<dyn PlatformApi>) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            platform,
        }
    }

    /// Opens an attempt and arms its countdown. Starting a running attempt
    /// again returns it unchanged; exams without a duration are untimed.
    pub fn start(&self, session: &Session, exam: &Exam) -> Result<AttemptView> {
        let bearer_token = session
            .bearer_token()
            .ok_or_else(|| Error::Forbidden("Exams require a signed-in student".to_string()))?
            .to_string();
        let exam_id = exam.summary.id.clone();
        let key = (session.id, exam_id.clone());

        let mut attempts = self.lock()?;
        if let Some(existing) = attempts.get(&key) {
            return match existing.status {
                AttemptStatus::Submitted => Err(Error::Conflict(
                    "This exam has already been submitted".to_string(),
                )),
                _ => Ok(existing.view(&exam_id)),
            };
        }

        let mut question_order = Vec::with_capacity(exam.questions.len());
        let mut kinds = HashMap::with_capacity(exam.questions.len());
        for (idx, q) in exam.questions.iter().enumerate() {
            let presented = q.present(idx);
            question_order.push(presented.id.clone());
            kinds.insert(presented.id, presented.kind);
        }

        let duration_minutes = exam.summary.duration_minutes;
        let (deadline, closes_at) = if duration_minutes > 0 {
            let (deadline, closes_at) = countdown(duration_minutes)?;
            (Some(deadline), Some(closes_at))
        } else {
            (None, None)
        };
        let cancel = CancellationToken::new();
        let attempt = Attempt {
            bearer_token,
            question_order,
            kinds,
            drafts: HashMap::new(),
            deadline,
            closes_at,
            status: AttemptStatus::InProgress,
            cancel: cancel.clone(),
            receipt: None,
        };
        let view = attempt.view(&exam_id);
        attempts.insert(key.clone(), attempt);
        drop(attempts);

        if let Some(at) = closes_at {
            self.arm_timer(key, at, cancel);
        }
        info!(session_id = %session.id, exam_id = %exam_id, ?deadline, "Exam attempt started");
        Ok(view)
    }

    fn arm_timer(&self, key: AttemptKey, at: Instant, cancel: CancellationToken) {
        let svc = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(exam_id = %key.1, "Exam countdown cancelled");
                }
                _ = tokio::time::sleep_until(at) => {
                    info!(session_id = %key.0, exam_id = %key.1, "Time is up, submitting exam");
                    if let Err(e) = svc.finish(&key, true).await {
                        error!(error = ?e, exam_id = %key.1, "Auto-submit failed");
                    }
                }
            }
        });
    }

    pub fn save_answer(
        &self,
        session_id: Uuid,
        exam_id: &str,
        question_id: &str,
        input: &AnswerInput,
    ) -> Result<AttemptView> {
        let mut attempts = self.lock()?;
        let attempt = attempts
            .get_mut(&(session_id, exam_id.to_string()))
            .ok_or_else(|| Error::NotFound("No attempt in progress for this exam".to_string()))?;
        if attempt.status != AttemptStatus::InProgress {
            return Err(Error::Conflict(
                "Answers cannot change after submission".to_string(),
            ));
        }
        // A failed auto-submit leaves the attempt open for a manual retry only.
        if attempt.closes_at.is_some_and(|at| Instant::now() >= at) {
            return Err(Error::Conflict("Time is up for this exam".to_string()));
        }
        let kind = *attempt
            .kinds
            .get(question_id)
            .ok_or_else(|| Error::BadRequest(format!("Unknown question {}", question_id)))?;

        let answer = Answer::from_input(kind, input);
        if answer.is_empty() {
            attempt.drafts.remove(question_id);
        } else {
            attempt
                .drafts
                .insert(question_id.to_string(), answer.to_wire());
        }
        Ok(attempt.view(exam_id))
    }

    pub fn view(&self, session_id: Uuid, exam_id: &str) -> Result<AttemptView> {
        let attempts = self.lock()?;
        attempts
            .get(&(session_id, exam_id.to_string()))
            .map(|a| a.view(exam_id))
            .ok_or_else(|| Error::NotFound("No attempt for this exam".to_string()))
    }

    pub async fn submit(&self, session_id: Uuid, exam_id: &str) -> Result<SubmissionReceipt> {
        self.finish(&(session_id, exam_id.to_string()), false).await
    }

    async fn finish(&self, key: &AttemptKey, auto_submitted: bool) -> Result<SubmissionReceipt> {
        let (token, answers) = {
            let mut attempts = self.lock()?;
            let attempt = attempts
                .get_mut(key)
                .ok_or_else(|| Error::NotFound("No attempt in progress for this exam".to_string()))?;
            if attempt.status != AttemptStatus::InProgress {
                return Err(Error::Conflict(
                    "This exam has already been submitted".to_string(),
                ));
            }
            attempt.status = AttemptStatus::Submitting;
            attempt.cancel.cancel();
            (attempt.bearer_token.clone(), attempt.submitted_answers())
        };

        let result = self
            .platform
            .submit_exam(&token, &key.1, &answers, auto_submitted)
            .await;

        let mut attempts = self.lock()?;
        match result {
            Ok(receipt) => {
                if let Some(attempt) = attempts.get_mut(key) {
                    attempt.status = AttemptStatus::Submitted;
                    attempt.receipt = Some(receipt.clone());
                }
                info!(exam_id = %key.1, auto_submitted, score = receipt.score, "Exam submitted");
                Ok(receipt)
            }
            Err(e) => {
                // Back to an editable state; the student can submit again by hand.
                if let Some(attempt) = attempts.get_mut(key) {
                    attempt.status = AttemptStatus::InProgress;
                }
                warn!(exam_id = %key.1, auto_submitted, error = %e, "Exam submission failed");
                Err(e)
            }
        }
    }

    /// Cancels and forgets every attempt owned by the session.
    pub fn teardown_session(&self, session_id: Uuid) -> Result<usize> {
        let mut attempts = self.lock()?;
        let keys: Vec<AttemptKey> = attempts
            .keys()
            .filter(|(sid, _)| *sid == session_id)
            .cloned()
            .collect();
        for key in &keys {
            if let Some(attempt) = attempts.remove(key) {
                attempt.cancel.cancel();
            }
        }
        Ok(keys.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<AttemptKey, Attempt>>> {
        self.attempts
            .lock()
            .map_err(|_| Error::Internal("attempt registry poisoned".to_string()))
    }
}

/// Wall-clock deadline and runtime instant `minutes` from now.
fn countdown(minutes: i64) -> Result<(DateTime<Utc>, Instant)> {
    let out_of_range =
        || Error::BadRequest(format!("Exam duration of {} minutes is out of range", minutes));
    let deadline = Duration::try_minutes(minutes)
        .and_then(|d| Utc::now().checked_add_signed(d))
        .ok_or_else(out_of_range)?;
    let closes_at = u64::try_from(minutes)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .and_then(|secs| Instant::now().checked_add(std::time::Duration::from_secs(secs)))
        .ok_or_else(out_of_range)?;
    Ok((deadline, closes_at))
}
