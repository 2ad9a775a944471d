//! # ra-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

pub mod account;
pub mod ads;
pub mod comments;
pub mod favorites;

use actix_web::http::header;
use actix_web::HttpResponse;
use askama::Template;
use ra_core::traits::{AuthProvider, ClassifiedsRepo};
use serde::Deserialize;

use crate::error::ApiResult;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn ClassifiedsRepo>,
    pub auth: Box<dyn AuthProvider>,
    pub config: WebConfig,
}

/// Knobs the handlers read at request time.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Largest accepted picture upload
    pub max_upload_bytes: u64,
    /// Ads shown on the list page
    pub list_limit: i64,
    pub session_ttl_days: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub secure_cookies: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 2 * 1024 * 1024,
            list_limit: 10,
            session_ttl_days: 14,
            secure_cookies: false,
        }
    }
}

/// Hidden field carried by every plain (non-multipart) form post.
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

pub(crate) fn render<T: Template>(page: &T) -> ApiResult<HttpResponse> {
    let html = page.render()?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// `/` has no page of its own.
pub async fn home() -> HttpResponse {
    see_other("/ads")
}
