//! # Request identity
//!
//! The logged-in user is an explicit handler argument: `CurrentUser` for
//! login-required endpoints, `MaybeUser` where anonymous visitors are fine.

use actix_web::dev::Payload;
use actix_web::http::Method;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use ra_core::error::AppError;
use ra_core::models::{Session, User};
use ra_core::traits::UserRepo;
use ra_ui::Nav;

use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl CurrentUser {
    /// Rejects form posts whose hidden token does not match the session's.
    pub fn verify_csrf(&self, submitted: &str) -> ApiResult<()> {
        if constant_time_eq(submitted.as_bytes(), self.session.csrf_token.as_bytes()) {
            Ok(())
        } else {
            log::warn!("CSRF token mismatch for user {}", self.user.username);
            Err(AppError::Forbidden("CSRF verification failed".into()).into())
        }
    }

    pub fn nav(&self, req: &HttpRequest) -> Nav {
        Nav::user(&self.user.username, &self.session.csrf_token, &page_path(req))
    }
}

/// `None` for anonymous visitors.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<uuid::Uuid> {
        self.0.as_ref().map(|u| u.user.id)
    }

    pub fn nav(&self, req: &HttpRequest) -> Nav {
        match &self.0 {
            Some(user) => user.nav(req),
            None => Nav::anonymous(&page_path(req)),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Path plus query string, as it should come back after login.
fn page_path(req: &HttpRequest) -> String {
    match req.uri().path_and_query() {
        Some(pq) => pq.as_str().to_string(),
        None => req.path().to_string(),
    }
}

async fn load_user(req: &HttpRequest) -> ApiResult<Option<CurrentUser>> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("AppState is not registered".into()))?;

    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Ok(None);
    };

    let found = state.repo.find_session(cookie.value()).await?;
    Ok(found.map(|(session, user)| CurrentUser { user, session }))
}

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match load_user(&req).await? {
                Some(user) => Ok(user),
                None => {
                    // Only a GET can be replayed after login.
                    let next = if req.method() == Method::GET {
                        page_path(&req)
                    } else {
                        "/ads".to_string()
                    };
                    Err(AppError::Unauthorized(next).into())
                }
            }
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(MaybeUser(load_user(&req).await?)) })
    }
}
