use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use chrono::{DateTime, Local};
use serde::Deserialize;
use sqlx::Row;

use crate::{auth::CurrentUser, error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/users", get(users_list))
        .route("/users/:id", get(user_detail).post(update_user_role))
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct AdminDashboardTemplate {
    user_count: i64,
    trip_count: i64,
    upcoming_count: i64,
}

async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_admin()?;
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    let trip_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trips")
        .fetch_one(&state.db)
        .await?;
    let upcoming_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trips WHERE start_date >= ?1")
            .bind(Local::now().date_naive())
            .fetch_one(&state.db)
            .await?;
    Ok(AskamaTemplateResponse::into_response(
        AdminDashboardTemplate {
            user_count,
            trip_count,
            upcoming_count,
        },
    ))
}

#[derive(Template)]
#[template(path = "admin/users_list.html")]
struct AdminUsersTemplate {
    users: Vec<AdminUserRow>,
}

#[derive(Clone)]
struct AdminUserRow {
    id: i64,
    uuid: String,
    username: String,
    email: String,
    role: String,
    created_at: String,
    last_login_at: String,
}

async fn users_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_admin()?;
    let rows = sqlx::query(
        r#"SELECT id, uuid, username, email, role, created_at, last_login_at FROM users ORDER BY created_at DESC"#,
    )
    .fetch_all(&state.db)
    .await?;
    let users = rows
        .into_iter()
        .map(|row| AdminUserRow {
            id: row.get("id"),
            uuid: row.get("uuid"),
            username: row.get("username"),
            email: row.get("email"),
            role: row.get("role"),
            created_at: format_datetime(row.get::<String, _>("created_at")),
            last_login_at: row
                .get::<Option<String>, _>("last_login_at")
                .map(format_datetime)
                .unwrap_or_else(|| "never".into()),
        })
        .collect();
    Ok(AskamaTemplateResponse::into_response(AdminUsersTemplate {
        users,
    }))
}

#[derive(Template)]
#[template(path = "admin/user_detail.html")]
struct AdminUserDetailTemplate {
    user: AdminUserRow,
    trip_count: i64,
    organized_count: i64,
}

async fn user_detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    current.require_admin()?;
    let row = sqlx::query(
        "SELECT id, uuid, username, email, role, created_at, last_login_at FROM users WHERE id = ?1",
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;
    let Some(row) = row else {
        return Err(AppError::NotFound);
    };
    let user_row = AdminUserRow {
        id: row.get("id"),
        uuid: row.get("uuid"),
        username: row.get("username"),
        email: row.get("email"),
        role: row.get("role"),
        created_at: format_datetime(row.get::<String, _>("created_at")),
        last_login_at: row
            .get::<Option<String>, _>("last_login_at")
            .map(format_datetime)
            .unwrap_or_else(|| "never".into()),
    };
    let trip_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trip_members WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&state.db)
            .await?;
    let organized_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trip_members WHERE user_id = ?1 AND organizer = 1",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;
    Ok(AskamaTemplateResponse::into_response(
        AdminUserDetailTemplate {
            user: user_row,
            trip_count,
            organized_count,
        },
    ))
}

#[derive(Deserialize)]
struct RoleForm {
    role: String,
}

async fn update_user_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, AppError> {
    current.require_admin()?;
    if !matches!(form.role.as_str(), "user" | "admin") {
        return Err(AppError::BadRequest("That is not a role".into()));
    }
    sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2")
        .bind(&form.role)
        .bind(user_id)
        .execute(&state.db)
        .await?;
    Ok(Redirect::to(&format!("/admin/users/{user_id}")))
}

fn format_datetime(raw: String) -> String {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or(raw)
}
