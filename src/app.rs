use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/journal", get(handlers::get_journal))
        .route("/api/date", post(handlers::select_date))
        .route("/api/date/today", post(handlers::reset_to_today))
        .route("/api/record", patch(handlers::patch_record))
        .route("/api/water/:pip", post(handlers::toggle_water))
        .route("/api/meals", post(handlers::add_meal))
        .route("/api/meals/:id", delete(handlers::remove_meal))
        .route("/api/misc", post(handlers::add_misc))
        .route("/api/misc/:id", delete(handlers::remove_misc))
        .route("/api/activities", post(handlers::add_activity))
        .route("/api/activities/:id", delete(handlers::remove_activity))
        .route("/api/history", get(handlers::get_history))
        .route("/api/recovery", get(handlers::get_recovery))
        .with_state(state)
}
