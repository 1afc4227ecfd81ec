use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::dto::auth_dto::{GuestRequest, LoginRequest, LogoutResponse, SessionResponse, SetFlagRequest};
use crate::error::Result;
use crate::middleware::auth::CurrentSession;
use crate::models::session::{Credential, Identity, Role, SessionFlags, SessionView};
use crate::utils::time::hours_from_now;
use crate::AppState;

async fn login_as(state: AppState, role: Role, req: LoginRequest) -> Result<Json<SessionResponse>> {
    req.validate()?;
    let grant = state.platform.login(role, req.email.trim(), &req.password).await?;

    let identity = Identity {
        user_id: grant.user.id,
        name: grant.user.name,
        email: grant.user.email,
        role,
    };
    let (session, token) = state
        .sessions
        .login(identity, Credential::Bearer(grant.token))?;

    Ok(Json(SessionResponse {
        token,
        session: SessionView::from(&session),
        guest_code_ttl_hours: None,
    }))
}

#[axum::debug_handler]
pub async fn student_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    login_as(state, Role::Student, req).await
}

#[axum::debug_handler]
pub async fn institute_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    login_as(state, Role::Institute, req).await
}

#[axum::debug_handler]
pub async fn guest_login(
    State(state): State<AppState>,
    Json(req): Json<GuestRequest>,
) -> Result<Json<SessionResponse>> {
    req.validate()?;
    let email = req.email.trim().to_string();
    let grant = state.platform.register_guest(req.name.trim(), &email).await?;
    let expires_at = grant
        .expires_at
        .unwrap_or_else(|| hours_from_now(state.guest_code_ttl_hours));

    let identity = Identity {
        user_id: format!("guest:{}", email),
        name: req.name.trim().to_string(),
        email,
        role: Role::Guest,
    };
    let (session, token) = state.sessions.login(
        identity,
        Credential::GuestCode {
            code: grant.guest_code,
            expires_at,
        },
    )?;

    Ok(Json(SessionResponse {
        token,
        session: SessionView::from(&session),
        guest_code_ttl_hours: Some(state.guest_code_ttl_hours),
    }))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<LogoutResponse>> {
    let cancelled_attempts = state.attempts.teardown_session(session.id)?;
    let logged_out = state.sessions.logout(session.id)?.is_some();
    Ok(Json(LogoutResponse {
        logged_out,
        cancelled_attempts,
    }))
}

#[axum::debug_handler]
pub async fn me(Extension(CurrentSession(session)): Extension<CurrentSession>) -> Json<SessionView> {
    Json(SessionView::from(&session))
}

#[axum::debug_handler]
pub async fn set_flag(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(req): Json<SetFlagRequest>,
) -> Result<Json<SessionFlags>> {
    Ok(Json(state.sessions.set_flag(session.id, req.flag)?))
}
