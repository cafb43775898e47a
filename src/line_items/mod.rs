use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
