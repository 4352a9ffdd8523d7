use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::{AppError, db::UserId};

/// Session key the identity collaborator writes the signed-in user id under.
pub const USER_ID: &str = "user_id";

/// The user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(UserId);

impl Caller {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self(user_id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn is(&self, user_id: &str) -> bool {
        self.0 == user_id
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| anyhow::anyhow!(msg))?;

        let Some(user_id) = session.get::<String>(USER_ID).await? else {
            return Err(AppError::Unauthenticated);
        };

        Ok(Caller(user_id))
    }
}
