mod edit;
mod joins;
mod list;
mod service;

use axum::{Router, routing::get};

use crate::AppState;

pub use service::{MeetupService, MeetupUpdate, NewMeetup};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/Meetups", get(list::meetups).post(edit::create))
        .route("/Meetups/JoinedBy", get(list::joined_by))
        .route("/Meetups/LaunchedBy", get(list::launched_by))
        .route(
            "/Meetups/{id}",
            get(edit::meetup).put(edit::update).delete(edit::cancel),
        )
        .route(
            "/Joins",
            get(joins::joins).post(joins::join).delete(joins::leave),
        )
}
