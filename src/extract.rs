//! Body extractors that report malformed input through `ApiError` instead of
//! axum's plain-text rejections.

use axum::{
    async_trait,
    extract::{rejection::FormRejection, rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Form, Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// `application/x-www-form-urlencoded` request body
#[derive(Debug, Clone)]
pub struct ValidForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => Err(form_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected JSON body: {}", rejection.body_text());
    body_rejection(rejection.status(), rejection.body_text())
}

fn form_rejection(rejection: FormRejection) -> ApiError {
    tracing::debug!("Rejected form body: {}", rejection.body_text());
    body_rejection(rejection.status(), rejection.body_text())
}

/// Oversized bodies keep their 413; anything else unreadable is a 422
fn body_rejection(status: StatusCode, message: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body is too large")
    } else {
        ApiError::validation_error(message, None)
    }
}
