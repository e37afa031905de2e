use axum::Router;
use tower_http::trace::TraceLayer;

pub mod debounce;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod triggers;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(triggers::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
