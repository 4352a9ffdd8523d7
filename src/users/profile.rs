use axum::{
    Json, debug_handler,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppResult, AppState,
    payload::Payload,
    session::Caller,
    views::{LoggedUser, PrivateUserViewModel, PublicUserViewModel},
};

use super::{Preview, ProfileUpdate, UserService};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileQuery {
    user_id: String,
    joined_amount: Option<u32>,
    launched_amount: Option<u32>,
}

impl ProfileQuery {
    fn preview(&self) -> Preview {
        Preview {
            joined: self.joined_amount,
            launched: self.launched_amount,
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn public(
    State(users): State<UserService>,
    Query(query): Query<ProfileQuery>,
) -> AppResult<Json<PublicUserViewModel>> {
    Ok(Json(users.public_profile(&query.user_id, query.preview()).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn private(
    State(users): State<UserService>,
    caller: Caller,
    Query(query): Query<ProfileQuery>,
) -> AppResult<Json<PrivateUserViewModel>> {
    Ok(Json(
        users
            .private_profile(&caller, &query.user_id, query.preview())
            .await?,
    ))
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_private(
    State(users): State<UserService>,
    caller: Caller,
    Payload(input): Payload<ProfileUpdate>,
) -> AppResult<StatusCode> {
    users.update_private_profile(&caller, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The client queries this as a collection and reads the first element.
#[debug_handler(state = AppState)]
pub(crate) async fn logged_user(
    State(users): State<UserService>,
    caller: Caller,
) -> AppResult<Json<Vec<LoggedUser>>> {
    Ok(Json(vec![users.logged_user(&caller).await?]))
}
