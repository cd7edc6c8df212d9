use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::{Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::session::Session,
    models::user::{User, UserRole},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "tripplan_session";
const SESSION_TTL_DAYS: i64 = 30;
const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The session middleware resolves the cookie and stashes the user
        // in request extensions before any handler runs.
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(Self(Some(user.clone())));
        }

        Ok(Self(None))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn require_admin(&self) -> Result<&AuthenticatedUser, AppError> {
        let user = self.require_user()?;
        if user.role == UserRole::Admin {
            Ok(user)
        } else {
            Err(AppError::Forbidden)
        }
    }
}

pub async fn register_user(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let username = username.trim();
    let email = email.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::BadRequest("A username is required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest(
            "That does not look like an email address".into(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::BadRequest(format!(
            "Passwords need at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let taken: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = ?1 OR username = ?2")
            .bind(&email)
            .bind(username)
            .fetch_optional(&state.db)
            .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest(
            "That username or email is already registered".into(),
        ));
    }

    let uuid = Uuid::new_v4().to_string();
    let password_hash = hash_password(password)?;
    let now = Utc::now();
    let id = sqlx::query(
        r#"INSERT INTO users (uuid, username, email, password_hash, role, created_at)
           VALUES (?1, ?2, ?3, ?4, 'user', ?5)"#,
    )
    .bind(&uuid)
    .bind(username)
    .bind(&email)
    .bind(&password_hash)
    .bind(now)
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    Ok(AuthenticatedUser {
        id,
        uuid,
        username: username.to_owned(),
        email,
        role: UserRole::User,
    })
}

/// Look a user up by username or email and check the password. Both failure
/// modes answer `Unauthorized` so the login form cannot be used to probe
/// which accounts exist.
pub async fn authenticate_user(
    state: &AppState,
    identifier: &str,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let identifier = identifier.trim();
    let user = sqlx::query_as::<_, User>(
        r#"SELECT id, uuid, username, email, password_hash, role, created_at, last_login_at
           FROM users WHERE email = ?1 OR username = ?2"#,
    )
    .bind(identifier.to_lowercase())
    .bind(identifier)
    .fetch_optional(&state.db)
    .await?;
    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };

    if !verify_password(&user.password_hash, password) {
        return Err(AppError::Unauthorized);
    }

    sqlx::query("UPDATE users SET last_login_at = ?1 WHERE id = ?2")
        .bind(Utc::now())
        .bind(user.id)
        .execute(&state.db)
        .await?;

    Ok(authenticated(user))
}

pub async fn create_session(state: &AppState, user_id: i64) -> Result<String, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let expires_at = now + Duration::days(SESSION_TTL_DAYS);
    sqlx::query(
        r#"INSERT INTO sessions (id, user_id, created_at, last_seen_at, expires_at)
           VALUES (?1, ?2, ?3, ?3, ?4)"#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(now)
    .bind(expires_at)
    .execute(&state.db)
    .await?;
    Ok(id)
}

pub async fn destroy_session(state: &AppState, session_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = ?1")
        .bind(session_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_owned());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    jar.remove(cookie)
}

/// Middleware: resolve the session cookie to an [`AuthenticatedUser`] and
/// stash it in request extensions for the [`CurrentUser`] extractor.
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = PrivateCookieJar::from_headers(request.headers(), state.cookie_key.clone());
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(user) = lookup_session_user(&state, cookie.value()).await? {
            request.extensions_mut().insert(user);
        }
    }
    Ok(next.run(request).await)
}

async fn lookup_session_user(
    state: &AppState,
    session_id: &str,
) -> Result<Option<AuthenticatedUser>, AppError> {
    let now = Utc::now();
    let session = sqlx::query_as::<_, Session>(
        r#"SELECT id, user_id, created_at, last_seen_at, expires_at
           FROM sessions WHERE id = ?1"#,
    )
    .bind(session_id)
    .fetch_optional(&state.db)
    .await?;
    let Some(session) = session else {
        return Ok(None);
    };
    if session.expires_at <= now {
        return Ok(None);
    }

    if let Err(err) = sqlx::query("UPDATE sessions SET last_seen_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(&session.id)
        .execute(&state.db)
        .await
    {
        warn!("failed to touch session: {err}");
    }

    let user = sqlx::query_as::<_, User>(
        r#"SELECT id, uuid, username, email, password_hash, role, created_at, last_login_at
           FROM users WHERE id = ?1"#,
    )
    .bind(session.user_id)
    .fetch_optional(&state.db)
    .await?;
    Ok(user.map(authenticated))
}

fn authenticated(user: User) -> AuthenticatedUser {
    AuthenticatedUser {
        id: user.id,
        uuid: user.uuid,
        username: user.username,
        email: user.email,
        role: UserRole::from_code(&user.role),
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}
