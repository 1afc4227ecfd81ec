use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::models::session::{Role, Session};
use crate::AppState;

/// Session resolved by the guard, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Unauthenticated,
    Forbidden,
}

/// Route-group decision for a resolved role. An empty `allowed` list admits any role.
pub fn decide(role: Option<Role>, allowed: &[Role]) -> Access {
    match role {
        None => Access::Unauthenticated,
        Some(role) if allowed.is_empty() || allowed.contains(&role) => Access::Allow,
        Some(_) => Access::Forbidden,
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(state, req, next, &[]).await
}

pub async fn require_student(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(state, req, next, &[Role::Student]).await
}

pub async fn require_institute(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    require_roles(state, req, next, &[Role::Institute]).await
}

pub async fn require_guest(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(state, req, next, &[Role::Guest]).await
}

pub async fn require_roles(
    state: AppState,
    mut req: Request,
    next: Next,
    allowed: &[Role],
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return reject(StatusCode::UNAUTHORIZED, "missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject(StatusCode::UNAUTHORIZED, "bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject(StatusCode::UNAUTHORIZED, "unsupported_scheme");
    };

    let Ok(claims) = state.sessions.verify_token(token.trim()) else {
        return reject(StatusCode::UNAUTHORIZED, "invalid_token");
    };
    let Ok(session_id) = Uuid::parse_str(&claims.sub) else {
        return reject(StatusCode::UNAUTHORIZED, "invalid_token");
    };
    let session = match state.sessions.get(session_id) {
        Ok(session) => session,
        Err(_) => {
            // Expired or logged out; nothing left to run for it.
            if let Err(e) = state.attempts.teardown_session(session_id) {
                tracing::error!(error = ?e, session_id = %session_id, "Attempt teardown failed");
            }
            return reject(StatusCode::UNAUTHORIZED, "session_expired");
        }
    };

    match decide(Some(session.identity.role), allowed) {
        Access::Allow => {
            req.extensions_mut().insert(CurrentSession(session));
            next.run(req).await
        }
        Access::Forbidden => {
            tracing::warn!(
                session_id = %session.id,
                role = session.identity.role.as_str(),
                path = %req.uri().path(),
                "Role not allowed on route"
            );
            reject(StatusCode::FORBIDDEN, "forbidden")
        }
        Access::Unauthenticated => reject(StatusCode::UNAUTHORIZED, "invalid_token"),
    }
}
