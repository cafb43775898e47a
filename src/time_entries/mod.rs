use crate::state::AppState;
use axum::Router;

pub mod clock;
mod dto;
pub mod handlers;
pub mod repo;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::timer_routes())
        .merge(handlers::approval_routes())
}
