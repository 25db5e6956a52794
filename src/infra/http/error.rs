use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use feedfront_api_types::{ApiErrorBody, ApiErrorMessage, codes};

use crate::application::error::ErrorReport;
use crate::application::feed::FeedError;
use crate::application::webhook::WebhookError;
use crate::domain::DomainError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(code: &'static str, message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Webhook token required",
            None,
        )
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    pub fn internal(hint: String) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "internal error",
            Some(hint),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::error",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

pub(crate) fn resource_to_api(err: DomainError) -> ApiError {
    ApiError::bad_request(
        codes::INVALID_RESOURCE,
        "invalid resource id",
        Some(err.to_string()),
    )
}

pub(crate) fn feed_to_api(err: FeedError) -> ApiError {
    match err {
        FeedError::InvalidResource(err) => resource_to_api(err),
        FeedError::InvalidQuery(err) => ApiError::bad_request(
            codes::INVALID_QUERY,
            "invalid pagination parameters",
            Some(err.to_string()),
        ),
        FeedError::ItemNotFound { .. } => {
            ApiError::not_found("item not found", Some(err.to_string()))
        }
        FeedError::Upstream(err) => ApiError::new(
            upstream_status(err.status()),
            codes::UPSTREAM,
            "upstream feed source failed",
            Some(err.to_string()),
        ),
    }
}

pub(crate) fn webhook_to_api(err: WebhookError) -> ApiError {
    match err {
        WebhookError::Unauthorized => ApiError::unauthorized(),
        WebhookError::Malformed(_) | WebhookError::MissingPath | WebhookError::InvalidPath { .. } => {
            ApiError::bad_request(
                codes::INVALID_WEBHOOK,
                "webhook payload does not reference a resource",
                Some(err.to_string()),
            )
        }
    }
}

/// Forward upstream error statuses; anything else becomes 502.
fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}
