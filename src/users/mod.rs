mod follows;
mod profile;
mod service;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use service::{Preview, ProfileUpdate, UserService};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/Users/Following", get(follows::following))
        .route("/Users/FollowedBy", get(follows::followed_by))
        .route("/Users/Public", get(profile::public))
        .route("/Users/Private", get(profile::private).put(profile::update_private))
        .route("/loggedUser", get(profile::logged_user))
        .route(
            "/Follows",
            post(follows::follow).delete(follows::unfollow),
        )
}
