//! Favorite toggles, called from the list page's script.
//!
//! Both are idempotent and answer with an empty 200. They take no CSRF
//! token.

use actix_web::{web, HttpResponse};
use ra_core::models::{Ad, Fav};
use ra_core::ownership;
use ra_core::traits::FavoriteRepo;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiResult;
use crate::extract::CurrentUser;

pub async fn add(data: web::Data<AppState>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let ad = ownership::find::<Ad, _>(&*data.repo, path.into_inner()).await?;
    data.repo.ensure_favorited(Fav { ad_id: ad.id, user_id: user.user.id }).await?;
    log::debug!("{} favorited ad {}", user.user.username, ad.id);
    Ok(HttpResponse::Ok().finish())
}

pub async fn remove(data: web::Data<AppState>, user: CurrentUser, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let ad = ownership::find::<Ad, _>(&*data.repo, path.into_inner()).await?;
    data.repo.ensure_unfavorited(Fav { ad_id: ad.id, user_id: user.user.id }).await?;
    log::debug!("{} unfavorited ad {}", user.user.username, ad.id);
    Ok(HttpResponse::Ok().finish())
}
