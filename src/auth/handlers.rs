use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};
use time::Duration;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{non_empty, CredentialsRequest, UpdateUserRequest},
        password::{hash_password, verify_password},
        repo::User,
        session::{clear_session_cookie, session_cookie, AuthSession, Session},
    },
    error::ApiError,
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (username, password) = payload.into_credentials()?;

    if User::find_by_username(&state.db, &username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(ApiError::DuplicateUsername);
    }

    let hash = hash_password(&password)?;
    let user = User::create(&state.db, &username, &hash).await?;

    info!(user_id = user.id, %username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "User created successfully"})),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let (username, password) = payload.into_credentials()?;

    // Unknown username and wrong password are indistinguishable on purpose.
    let user = match User::find_by_username(&state.db, &username).await? {
        Some(user) => user,
        None => {
            warn!(%username, "login with unknown username");
            return Err(ApiError::InvalidCredentials);
        }
    };
    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let ttl = Duration::minutes(state.config.session.ttl_minutes);
    let session = Session::create(&state.db, user.id, ttl).await?;
    let jar = jar.add(session_cookie(&session));

    info!(user_id = user.id, "user logged in");
    Ok((jar, Json(json!({"message": "Logged in successfully"}))))
}

#[instrument(skip_all, fields(user_id = session.user_id))]
pub async fn update_user(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let new_username = non_empty(payload.username);
    let new_password = non_empty(payload.password);
    if new_username.is_none() && new_password.is_none() {
        return Err(ApiError::MissingField(
            "Provide a new username or a new password",
        ));
    }

    if let Some(username) = new_username.as_deref() {
        if let Some(existing) = User::find_by_username(&state.db, username).await? {
            if existing.id != session.user_id {
                warn!(user_id = session.user_id, %username, "username already taken");
                return Err(ApiError::DuplicateUsername);
            }
        }
    }

    let new_hash = new_password.as_deref().map(hash_password).transpose()?;
    User::update(
        &state.db,
        session.user_id,
        new_username.as_deref(),
        new_hash.as_deref(),
    )
    .await?;

    info!(user_id = session.user_id, "user updated");
    Ok(Json(json!({"message": "User updated successfully"})))
}

#[instrument(skip_all, fields(user_id = session.user_id))]
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    Session::delete(&state.db, session.token).await?;
    let jar = clear_session_cookie(jar);

    info!(user_id = session.user_id, "user logged out");
    Ok((jar, Json(json!({"message": "Logged out successfully"}))))
}

#[instrument(skip_all, fields(user_id = session.user_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: AuthSession,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    User::delete_cascading(&state.db, session.user_id).await?;
    let jar = clear_session_cookie(jar);

    info!(user_id = session.user_id, "user and owned meals deleted");
    Ok((jar, Json(json!({"message": "User deleted successfully"}))))
}
