use crate::error::{Error, Result};
use crate::models::exam::{
    Exam, ExamResult, ExamSummary, NewExam, SubmissionReceipt, SubmittedAnswer,
};
use crate::models::session::Role;
use crate::models::student::{BulkStudentResponse, NewStudent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const GUEST_CODE_HEADER: &str = "X-Guest-Code";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginGrant {
    pub token: String,
    pub user: PlatformUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestGrant {
    pub guest_code: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Operations the gateway needs from the exam platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn login(&self, role: Role, email: &str, password: &str) -> Result<LoginGrant>;
    async fn register_guest(&self, name: &str, email: &str) -> Result<GuestGrant>;

    async fn list_student_exams(&self, token: &str) -> Result<Vec<ExamSummary>>;
    async fn get_student_exam(&self, token: &str, exam_id: &str) -> Result<Exam>;
    async fn submit_exam(
        &self,
        token: &str,
        exam_id: &str,
        answers: &[SubmittedAnswer],
        auto_submitted: bool,
    ) -> Result<SubmissionReceipt>;
    async fn list_student_results(&self, token: &str) -> Result<Vec<ExamResult>>;

    async fn list_institute_exams(&self, token: &str) -> Result<Vec<ExamSummary>>;
    async fn create_exam(&self, token: &str, exam: &NewExam) -> Result<ExamSummary>;
    async fn exam_results(&self, token: &str, exam_id: &str) -> Result<Vec<ExamResult>>;
    async fn bulk_create_students(
        &self,
        token: &str,
        students: &[NewStudent],
    ) -> Result<BulkStudentResponse>;

    async fn get_guest_exam(&self, guest_code: &str, exam_id: &str) -> Result<Exam>;
    async fn create_guest_exam(&self, guest_code: &str, exam: &NewExam) -> Result<ExamSummary>;
}

#[derive(Clone)]
pub struct PlatformClient {
    client: Client,
    base_url: Url,
}

impl PlatformClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.get(self.endpoint(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.post(self.endpoint(path)?))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        let status = resp.status();
        let url = resp.url().path().to_string();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            warn!(status = status.as_u16(), path = %url, %message, "Platform request failed");
            return Err(Error::Platform {
                status: status.as_u16(),
                message,
            });
        }
        debug!(status = status.as_u16(), path = %url, "Platform request succeeded");
        Ok(resp.json::<T>().await?)
    }
}

/// Pulls a human-readable message out of a platform error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonValue>(trimmed) {
        Ok(value) => ["message", "error", "msg"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn login(&self, role: Role, email: &str, password: &str) -> Result<LoginGrant> {
        let path = match role {
            Role::Student => "auth/student/login",
            Role::Institute => "auth/institute/login",
            Role::Guest => {
                return Err(Error::BadRequest(
                    "Guests sign in with a guest code".to_string(),
                ))
            }
        };
        let req = self
            .post(path)?
            .json(&json!({ "email": email, "password": password }));
        self.send(req).await
    }

    async fn register_guest(&self, name: &str, email: &str) -> Result<GuestGrant> {
        let req = self
            .post("guest/register")?
            .json(&json!({ "name": name, "email": email }));
        self.send(req).await
    }

    async fn list_student_exams(&self, token: &str) -> Result<Vec<ExamSummary>> {
        let req = self.get("student/exams")?.bearer_auth(token);
        self.send(req).await
    }

    async fn get_student_exam(&self, token: &str, exam_id: &str) -> Result<Exam> {
        let req = self
            .get(&format!("student/exams/{}", exam_id))?
            .bearer_auth(token);
        self.send(req).await
    }

    async fn submit_exam(
        &self,
        token: &str,
        exam_id: &str,
        answers: &[SubmittedAnswer],
        auto_submitted: bool,
    ) -> Result<SubmissionReceipt> {
        let req = self
            .post(&format!("student/exams/{}/submit", exam_id))?
            .bearer_auth(token)
            .json(&json!({ "answers": answers, "autoSubmitted": auto_submitted }));
        self.send(req).await
    }

    async fn list_student_results(&self, token: &str) -> Result<Vec<ExamResult>> {
        let req = self.get("student/results")?.bearer_auth(token);
        self.send(req).await
    }

    async fn list_institute_exams(&self, token: &str) -> Result<Vec<ExamSummary>> {
        let req = self.get("institute/exams")?.bearer_auth(token);
        self.send(req).await
    }

    async fn create_exam(&self, token: &str, exam: &NewExam) -> Result<ExamSummary> {
        let req = self.post("institute/exams")?.bearer_auth(token).json(exam);
        self.send(req).await
    }

    async fn exam_results(&self, token: &str, exam_id: &str) -> Result<Vec<ExamResult>> {
        let req = self
            .get(&format!("institute/exams/{}/results", exam_id))?
            .bearer_auth(token);
        self.send(req).await
    }

    async fn bulk_create_students(
        &self,
        token: &str,
        students: &[NewStudent],
    ) -> Result<BulkStudentResponse> {
        let req = self
            .post("institute/students/bulk")?
            .bearer_auth(token)
            .json(&json!({ "students": students }));
        self.send(req).await
    }

    async fn get_guest_exam(&self, guest_code: &str, exam_id: &str) -> Result<Exam> {
        let req = self
            .get(&format!("guest/exams/{}", exam_id))?
            .header(GUEST_CODE_HEADER, guest_code);
        self.send(req).await
    }

    async fn create_guest_exam(&self, guest_code: &str, exam: &NewExam) -> Result<ExamSummary> {
        let req = self
            .post("guest/exams")?
            .header(GUEST_CODE_HEADER, guest_code)
            .json(exam);
        self.send(req).await
    }
}
