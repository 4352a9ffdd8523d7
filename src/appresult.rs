use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("no caller identity in session")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("user {user_id} and its profile disagree on existence")]
    Inconsistent { user_id: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }

    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            Validation { .. } | Malformed(_) => StatusCode::BAD_REQUEST,
            Unauthenticated => StatusCode::UNAUTHORIZED,
            Forbidden => StatusCode::FORBIDDEN,
            NotFound { .. } => StatusCode::NOT_FOUND,
            Conflict(_) => StatusCode::CONFLICT,
            Inconsistent { .. } | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct Problem {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (kind, detail, field) = match &self {
            AppError::Validation { field, message } => ("validation", message.clone(), Some(*field)),
            AppError::Malformed(_) => ("malformed", self.to_string(), None),
            AppError::Unauthenticated => ("unauthenticated", self.to_string(), None),
            AppError::Forbidden => ("forbidden", "caller may not access this resource".to_owned(), None),
            AppError::NotFound { .. } => ("not-found", self.to_string(), None),
            AppError::Conflict(_) => ("conflict", self.to_string(), None),
            AppError::Inconsistent { .. } => {
                tracing::error!(error = %self, "user and profile rows are inconsistent");
                ("inconsistent", "stored user data is inconsistent".to_owned(), None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                ("internal", "an internal error occurred".to_owned(), None)
            }
        };

        let problem = Problem {
            kind,
            title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            detail,
            field,
        };

        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(problem),
        )
            .into_response()
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(tower_sessions::session::Error);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::validation("title", "too long").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Malformed("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("meetup").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("stale".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Inconsistent { user_id: "u".into() }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn forbidden_body_leaks_nothing() {
        let response = AppError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
