use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    AppResult, AppState,
    db::{Meetup, MeetupId},
    payload::Payload,
    session::Caller,
};

use super::{MeetupService, MeetupUpdate, NewMeetup};

#[debug_handler(state = AppState)]
pub(crate) async fn meetup(
    State(meetups): State<MeetupService>,
    _caller: Caller,
    Path(id): Path<MeetupId>,
) -> AppResult<Json<Meetup>> {
    Ok(Json(meetups.get(id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(meetups): State<MeetupService>,
    caller: Caller,
    Payload(input): Payload<NewMeetup>,
) -> AppResult<Response> {
    let meetup = meetups.create(&caller, input).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/Meetups/{}", meetup.id))],
        Json(meetup),
    )
        .into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn update(
    State(meetups): State<MeetupService>,
    caller: Caller,
    Path(id): Path<MeetupId>,
    Payload(patch): Payload<MeetupUpdate>,
) -> AppResult<Json<Meetup>> {
    Ok(Json(meetups.update(&caller, id, patch).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn cancel(
    State(meetups): State<MeetupService>,
    caller: Caller,
    Path(id): Path<MeetupId>,
) -> AppResult<Json<Meetup>> {
    Ok(Json(meetups.cancel(&caller, id).await?))
}
