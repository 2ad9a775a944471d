//! Login and logout. Accounts themselves are created with the `seed` tool.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use ra_core::models::Session;
use ra_core::traits::{AuthProvider, UserRepo};
use ra_ui::{LoginTemplate, Nav};
use serde::Deserialize;

use super::{render, AppState, CsrfForm};
use crate::error::ApiResult;
use crate::extract::{CurrentUser, MaybeUser, SESSION_COOKIE};

const LOGIN_FAILED: &str = "Please enter a correct username and password.";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Only local absolute paths are followed after login.
fn safe_next(next: &str) -> &str {
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    if local {
        next
    } else {
        "/ads"
    }
}

pub async fn login_form(req: HttpRequest, user: MaybeUser, query: web::Query<LoginQuery>) -> ApiResult<HttpResponse> {
    let page = LoginTemplate {
        nav: user.nav(&req),
        username: String::new(),
        next: query.into_inner().next.unwrap_or_default(),
        error: String::new(),
    };
    render(&page)
}

pub async fn login(data: web::Data<AppState>, req: HttpRequest, form: web::Form<LoginForm>) -> ApiResult<HttpResponse> {
    let form = form.into_inner();

    let user = match data.repo.find_user_by_username(form.username.trim()).await? {
        Some(user) if data.auth.verify_password(&form.password, &user.password_hash) => user,
        _ => {
            log::info!("Failed login for '{}'", form.username);
            let page = LoginTemplate {
                nav: Nav::anonymous(req.path()),
                username: form.username,
                next: form.next,
                error: LOGIN_FAILED.to_string(),
            };
            return render(&page);
        }
    };

    let now = Utc::now();
    let ttl_days = data.config.session_ttl_days;
    let session = Session {
        token: data.auth.generate_token()?,
        user_id: user.id,
        csrf_token: data.auth.generate_token()?,
        created_at: now,
        expires_at: now + Duration::days(ttl_days),
    };
    let cookie = Cookie::build(SESSION_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(data.config.secure_cookies)
        .max_age(time::Duration::days(ttl_days))
        .finish();
    data.repo.create_session(session).await?;
    log::info!("{} logged in", user.username);

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, safe_next(&form.next)))
        .cookie(cookie)
        .finish())
}

/// Ends the session and clears the cookie.
pub async fn logout(data: web::Data<AppState>, user: CurrentUser, form: web::Form<CsrfForm>) -> ApiResult<HttpResponse> {
    user.verify_csrf(&form.csrf_token)?;
    data.repo.delete_session(&user.session.token).await?;
    log::info!("{} logged out", user.user.username);

    let cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .finish();
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/ads"))
        .cookie(cookie)
        .finish())
}
