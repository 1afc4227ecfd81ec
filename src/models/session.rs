use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Institute,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Institute => "institute",
            Role::Guest => "guest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Credential presented to the exam platform on behalf of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    Bearer(String),
    GuestCode {
        code: String,
        expires_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionFlags {
    pub sample_test_completed: bool,
    pub guest_notice_acknowledged: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub identity: Identity,
    pub credential: Credential,
    pub flags: SessionFlags,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.expires_at <= now {
            return true;
        }
        match &self.credential {
            Credential::GuestCode { expires_at, .. } => *expires_at <= now,
            Credential::Bearer(_) => false,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        match &self.credential {
            Credential::Bearer(token) => Some(token),
            Credential::GuestCode { .. } => None,
        }
    }

    pub fn guest_code(&self) -> Option<&str> {
        match &self.credential {
            Credential::GuestCode { code, .. } => Some(code),
            Credential::Bearer(_) => None,
        }
    }
}

/// What the UI learns about the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub identity: Identity,
    pub flags: SessionFlags,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_code_expires_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let guest_code_expires_at = match &session.credential {
            Credential::GuestCode { expires_at, .. } => Some(*expires_at),
            Credential::Bearer(_) => None,
        };
        Self {
            session_id: session.id,
            identity: session.identity.clone(),
            flags: session.flags.clone(),
            expires_at: session.expires_at,
            guest_code_expires_at,
        }
    }
}
