//! Response envelope (§6): `{success, data?, error?, meta?}`, with
//! `error = {code, message, details?}` and `meta = {total, page,
//! page_size, total_pages}`. Every handler returns `ApiResult<T>`; the
//! `IntoResponse` impl on [`ApiError`] is the single place domain errors
//! become HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use loadtest_domain::LoadTestError;
use serde::Serialize;

pub type ApiResult<T> = Result<SuccessResponse<T>, ApiError>;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Serialize, Clone, Copy)]
pub struct Meta {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl Meta {
    pub fn paged(total: i64, page: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let total_pages = ((total.max(0) as u64).div_ceil(page_size as u64)) as u32;
        Self {
            total,
            page: page.max(1),
            page_size,
            total_pages: total_pages.max(1),
        }
    }
}

/// A successful response: a status code, the payload, and optional
/// pagination metadata.
pub struct SuccessResponse<T> {
    status: StatusCode,
    data: Option<T>,
    meta: Option<Meta>,
}

impl<T> SuccessResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data: Some(data),
            meta: None,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data: Some(data),
            meta: None,
        }
    }

    pub fn paged(data: T, meta: Meta) -> Self {
        Self {
            status: StatusCode::OK,
            data: Some(data),
            meta: Some(meta),
        }
    }
}

impl SuccessResponse<()> {
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            data: None,
            meta: None,
        }
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }
        let body = Envelope {
            success: true,
            data: self.data,
            error: None,
            meta: self.meta,
        };
        (self.status, Json(body)).into_response()
    }
}

/// A failed response, built from a [`LoadTestError`] or a handler-local
/// validation failure.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "validation",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found",
            message: message.into(),
        }
    }
}

impl From<LoadTestError> for ApiError {
    fn from(err: LoadTestError) -> Self {
        let status = match &err {
            LoadTestError::Validation(_) => StatusCode::BAD_REQUEST,
            LoadTestError::NotFound(_) => StatusCode::NOT_FOUND,
            LoadTestError::Forbidden(_) => StatusCode::FORBIDDEN,
            LoadTestError::Conflict(_) => StatusCode::CONFLICT,
            LoadTestError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LoadTestError::TooManyConcurrent => StatusCode::TOO_MANY_REQUESTS,
            LoadTestError::InvalidState(_) => StatusCode::CONFLICT,
            LoadTestError::UpstreamIo(_) | LoadTestError::Fatal(_) | LoadTestError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            code: err.category(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: self.code,
                message: self.message,
                details: None,
            }),
            meta: None,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_rounds_up_total_pages() {
        let meta = Meta::paged(21, 1, 10);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn meta_never_reports_zero_pages() {
        let meta = Meta::paged(0, 1, 10);
        assert_eq!(meta.total_pages, 1);
    }

    #[test]
    fn too_many_concurrent_maps_to_429() {
        let err: ApiError = LoadTestError::TooManyConcurrent.into();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    }
}
