use axum::{
    Json, debug_handler,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    AppResult, AppState,
    session::Caller,
    views::{MeetupView, MeetupViewModel},
};

use super::MeetupService;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
pub(crate) struct PageQuery {
    start: Option<u32>,
    amount: Option<u32>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn joined_by(
    State(meetups): State<MeetupService>,
    _caller: Caller,
    Query(UserQuery { user_id }): Query<UserQuery>,
) -> AppResult<Json<Vec<MeetupView>>> {
    Ok(Json(meetups.joined_by(&user_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn launched_by(
    State(meetups): State<MeetupService>,
    _caller: Caller,
    Query(UserQuery { user_id }): Query<UserQuery>,
) -> AppResult<Json<Vec<MeetupView>>> {
    Ok(Json(meetups.launched_by(&user_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn meetups(
    State(meetups): State<MeetupService>,
    _caller: Caller,
    Query(PageQuery { start, amount }): Query<PageQuery>,
) -> AppResult<Json<Vec<MeetupViewModel>>> {
    Ok(Json(meetups.list(start, amount).await?))
}
