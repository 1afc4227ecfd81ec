use crate::error::{Error, Result};
use crate::models::session::{Credential, Identity, Role, Session, SessionFlags};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Claims of the gateway-issued session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFlag {
    SampleTestCompleted,
    GuestNoticeAcknowledged,
}

/// Owns every live session. Sessions are created by login, changed only through
/// this store, and removed on logout or expiry.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    jwt_secret: Arc<String>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(jwt_secret: String, ttl_hours: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            jwt_secret: Arc::new(jwt_secret),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    /// Creates a session and returns it with its signed token.
    pub fn login(&self, identity: Identity, credential: Credential) -> Result<(Session, String)> {
        let now = Utc::now();
        let mut expires_at = now + self.ttl;
        if let Credential::GuestCode {
            expires_at: code_expiry,
            ..
        } = &credential
        {
            expires_at = expires_at.min(*code_expiry);
        }

        let session = Session {
            id: Uuid::new_v4(),
            identity,
            credential,
            flags: SessionFlags::default(),
            created_at: now,
            expires_at,
        };

        let claims = Claims {
            sub: session.id.to_string(),
            role: session.identity.role,
            exp: expires_at.timestamp().max(0) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        self.write()?.insert(session.id, session.clone());
        tracing::info!(
            session_id = %session.id,
            role = session.identity.role.as_str(),
            "Session started"
        );
        Ok((session, token))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    /// Live session for `id`; expired sessions are removed and reported as unauthorized.
    pub fn get(&self, id: Uuid) -> Result<Session> {
        let session = self
            .read()?
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("session_not_found".to_string()))?;
        if session.is_expired(Utc::now()) {
            self.write()?.remove(&id);
            return Err(Error::Unauthorized("session_expired".to_string()));
        }
        Ok(session)
    }

    pub fn set_flag(&self, id: Uuid, flag: SessionFlag) -> Result<SessionFlags> {
        let mut sessions = self.write()?;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| Error::Unauthorized("session_not_found".to_string()))?;
        match flag {
            SessionFlag::SampleTestCompleted => session.flags.sample_test_completed = true,
            SessionFlag::GuestNoticeAcknowledged => session.flags.guest_notice_acknowledged = true,
        }
        Ok(session.flags.clone())
    }

    /// Removes the session; returns it so callers can tear down what it owned.
    pub fn logout(&self, id: Uuid) -> Result<Option<Session>> {
        let removed = self.write()?.remove(&id);
        if removed.is_some() {
            tracing::info!(session_id = %id, "Session ended");
        }
        Ok(removed)
    }

    /// Drops expired sessions and returns their ids.
    pub fn purge_expired(&self) -> Result<Vec<Uuid>> {
        let now = Utc::now();
        let mut sessions = self.write()?;
        let expired: Vec<Uuid> = sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Purged expired sessions");
        }
        Ok(expired)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Uuid, Session>>> {
        self.sessions
            .read()
            .map_err(|_| Error::Internal("session store poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Session>>> {
        self.sessions
            .write()
            .map_err(|_| Error::Internal("session store poisoned".to_string()))
    }
}
