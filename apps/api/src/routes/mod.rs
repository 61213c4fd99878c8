pub mod bot;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/config", get(bot::handle_get_config))
        // Approval queue
        .route(
            "/api/bot/pending",
            get(bot::handle_list_pending).post(bot::handle_save_pending),
        )
        .route("/api/bot/manual-apply", post(bot::handle_manual_apply))
        .route("/api/bot/discard", post(bot::handle_discard))
        // History and dashboard
        .route("/api/bot/history", get(bot::handle_list_history))
        .route("/api/bot/log-application", post(bot::handle_log_application))
        .route(
            "/api/bot/update-channel-name",
            post(bot::handle_update_channel_name),
        )
        .with_state(state)
}
