use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_form))
        .route("/users/:user", get(handlers::dashboard))
        .route("/users/:user/records", post(handlers::create_record_form))
        .route("/users/:user/records/:id", post(handlers::update_record_form))
        .route("/users/:user/records/:id/delete", post(handlers::delete_record_form))
        .route("/api/login", post(handlers::login))
        .route(
            "/api/users/:user/records",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/api/users/:user/records/:id",
            put(handlers::update_record).delete(handlers::delete_record),
        )
        .route("/api/users/:user/stats", get(handlers::get_stats))
        .route("/api/users/:user/export", get(handlers::export_records))
        .route("/api/users/:user/import", post(handlers::import_records))
        .with_state(state)
}
