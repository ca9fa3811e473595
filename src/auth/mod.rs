use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/creater_user", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/update", put(handlers::update_user))
        .route("/logout", get(handlers::logout))
        .route("/delete", delete(handlers::delete_user))
}
