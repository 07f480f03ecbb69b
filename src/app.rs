use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/api/tasks/:id",
            patch(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/api/tasks/:id/days/:day", put(handlers::update_day_status))
        .route("/api/week", post(handlers::start_new_week))
        .route("/api/level", get(handlers::get_level))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/prediction", get(handlers::get_prediction))
        .route("/api/suggestions", post(handlers::get_suggestions))
        .route("/api/rest", get(handlers::get_rest_suggestions))
        .route("/api/motivation", get(handlers::get_motivation))
        .route(
            "/api/reminders",
            get(handlers::list_reminders).post(handlers::create_reminder),
        )
        .route("/api/reminders/:id", delete(handlers::delete_reminder))
        .with_state(state)
}
