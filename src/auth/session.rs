use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub const SESSION_COOKIE: &str = "session";

/// One server-side login. The token is the only thing the client holds.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: Uuid,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub async fn create(db: &PgPool, user_id: i64, ttl: Duration) -> Result<Session, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(OffsetDateTime::now_utc() + ttl)
        .fetch_one(db)
        .await?;
        Ok(session)
    }

    /// Map a token to its user, ignoring expired rows.
    pub async fn resolve(db: &PgPool, token: Uuid) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT user_id
            FROM sessions
            WHERE token = $1 AND expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, token: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Cookie carrying the session token back to the client. The cookie expires
/// together with the server-side row.
pub fn session_cookie(session: &Session) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(session.expires_at - OffsetDateTime::now_utc())
        .build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}

/// Guard resolving the caller's identity from the session cookie. Handlers
/// taking this as an argument never run unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct AuthSession {
    pub token: Uuid,
    pub user_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok())
            .ok_or(ApiError::Unauthorized)?;

        match Session::resolve(&state.db, token).await? {
            Some(user_id) => Ok(AuthSession { token, user_id }),
            None => {
                warn!("session missing or expired");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_hour_session() -> Session {
        Session {
            token: Uuid::new_v4(),
            user_id: 1,
            expires_at: OffsetDateTime::now_utc() + Duration::minutes(30),
        }
    }

    #[test]
    fn session_cookie_is_scoped_and_http_only() {
        let session = half_hour_session();
        let cookie = session_cookie(&session);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), session.token.to_string());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        let max_age = cookie.max_age().expect("max age set");
        assert!(max_age > Duration::minutes(29) && max_age <= Duration::minutes(30));
    }

    #[test]
    fn clearing_drops_the_cookie_from_the_jar() {
        let jar = CookieJar::from_headers(&axum::http::HeaderMap::new())
            .add(session_cookie(&half_hour_session()));
        assert!(jar.get(SESSION_COOKIE).is_some());
        let jar = clear_session_cookie(jar);
        assert!(jar.get(SESSION_COOKIE).is_none());
    }
}
