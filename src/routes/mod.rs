pub mod account;
pub mod admin;
pub mod public;
pub mod trips;

use axum::{middleware, Router};
use tower_http::services::ServeDir;

use crate::{auth, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .nest("/trips", trips::router())
        .nest("/profile", account::router())
        .nest("/admin", admin::router())
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::load_session,
        ))
        .with_state(state)
}
