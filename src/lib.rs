pub mod access;
pub mod appresult;
pub mod config;
pub mod db;
pub mod logging;
pub mod meetups;
pub mod payload;
pub mod request_id;
pub mod session;
pub mod store;
pub mod users;
pub mod views;

use std::sync::Arc;

use axum::{Router, extract::FromRef, routing::get};
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

pub use appresult::{AppError, AppResult};
pub use config::Config;
pub use meetups::MeetupService;
pub use users::UserService;

use store::Store;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub meetups: MeetupService,
    pub users: UserService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            meetups: MeetupService::new(store.clone()),
            users: UserService::new(store),
        }
    }
}

/// Every API route with its state applied. Callers add the session layer,
/// which must wrap this router for [`session::Caller`] to resolve.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(meetups::router())
        .merge(users::router());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api)
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(request_id::header()))
        .layer(request_id::trace_layer())
        .layer(SetRequestIdLayer::new(request_id::header(), request_id::MakeRequestUuid))
        .layer(CorsLayer::permissive())
}
