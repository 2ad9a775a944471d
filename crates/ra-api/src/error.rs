//! # ApiError
//!
//! HTTP face of `AppError`. Ownership failures arrive here as `NotFound`
//! and leave as a plain 404, same as a missing row.

use std::fmt;

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use ra_core::error::AppError;
use ra_ui::login_location;

#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(err.into())
    }
}

impl From<askama::Error> for ApiError {
    fn from(err: askama::Error) -> Self {
        ApiError(AppError::Internal(format!("template rendering failed: {err}")))
    }
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        ApiError(AppError::ValidationError(format!("malformed upload: {err}")))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::SEE_OTHER,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match &self.0 {
            AppError::Unauthorized(next) => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, login_location(next)))
                .finish(),
            AppError::Internal(msg) => {
                log::error!("{}", msg);
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("Internal Server Error")
            }
            AppError::NotFound(kind, id) => {
                log::debug!("{} {} not found", kind, id);
                HttpResponse::NotFound()
                    .content_type("text/plain; charset=utf-8")
                    .body("Not Found")
            }
            other => {
                log::warn!("{}", other);
                HttpResponse::build(self.status_code())
                    .content_type("text/plain; charset=utf-8")
                    .body(other.to_string())
            }
        }
    }
}
