use axum::{
    Json, debug_handler,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppResult, AppState, db::Follow, payload::Payload, session::Caller, views::FollowProfileView,
};

use super::UserService;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FollowRef {
    followed_user_id: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn following(
    State(users): State<UserService>,
    Query(UserQuery { user_id }): Query<UserQuery>,
) -> AppResult<Json<Vec<FollowProfileView>>> {
    Ok(Json(users.following(&user_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn followed_by(
    State(users): State<UserService>,
    Query(UserQuery { user_id }): Query<UserQuery>,
) -> AppResult<Json<Vec<FollowProfileView>>> {
    Ok(Json(users.followed_by(&user_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn follow(
    State(users): State<UserService>,
    caller: Caller,
    Payload(FollowRef { followed_user_id }): Payload<FollowRef>,
) -> AppResult<(StatusCode, Json<Follow>)> {
    let follow = users.follow(&caller, &followed_user_id).await?;
    Ok((StatusCode::CREATED, Json(follow)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn unfollow(
    State(users): State<UserService>,
    caller: Caller,
    Query(FollowRef { followed_user_id }): Query<FollowRef>,
) -> AppResult<StatusCode> {
    users.unfollow(&caller, &followed_user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
