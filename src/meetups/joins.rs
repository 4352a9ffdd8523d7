use axum::{
    Json, debug_handler,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppResult, AppState,
    db::{Join, MeetupId},
    payload::Payload,
    session::Caller,
    views::JoinView,
};

use super::MeetupService;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MeetupRef {
    meetup_id: MeetupId,
}

#[debug_handler(state = AppState)]
pub(crate) async fn joins(
    State(meetups): State<MeetupService>,
    _caller: Caller,
    Query(MeetupRef { meetup_id }): Query<MeetupRef>,
) -> AppResult<Json<Vec<JoinView>>> {
    Ok(Json(meetups.joins(meetup_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn join(
    State(meetups): State<MeetupService>,
    caller: Caller,
    Payload(MeetupRef { meetup_id }): Payload<MeetupRef>,
) -> AppResult<(StatusCode, Json<Join>)> {
    let join = meetups.join(&caller, meetup_id).await?;
    Ok((StatusCode::CREATED, Json(join)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn leave(
    State(meetups): State<MeetupService>,
    caller: Caller,
    Query(MeetupRef { meetup_id }): Query<MeetupRef>,
) -> AppResult<StatusCode> {
    meetups.leave(&caller, meetup_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
