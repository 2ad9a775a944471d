//! Ad pages: list, detail, create, update, delete and the picture stream.

use std::collections::HashSet;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use ra_core::error::AppError;
use ra_core::forms::AdInput;
use ra_core::models::Ad;
use ra_core::ownership;
use ra_core::traits::{AdRepo, CommentRepo, FavoriteRepo};
use ra_ui::{AdDetailTemplate, AdFormTemplate, AdListTemplate, AdRow, AdView, CommentRow, ConfirmDeleteTemplate};
use serde::Deserialize;
use uuid::Uuid;

use super::{render, see_other, AppState, CsrfForm};
use crate::error::ApiResult;
use crate::extract::{CurrentUser, MaybeUser};
use crate::multipart::read_ad_form;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Renders the ad list, optionally filtered by `?search=`.
pub async fn list(
    data: web::Data<AppState>,
    req: HttpRequest,
    user: MaybeUser,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let search = query.into_inner().search.unwrap_or_default();
    let term = Some(search.trim()).filter(|s| !s.is_empty());

    let ads = data.repo.list_ads(term, data.config.list_limit).await?;
    let favorites = match user.id() {
        Some(user_id) => data.repo.favorite_ad_ids(user_id).await?,
        None => HashSet::new(),
    };

    let now = Utc::now();
    let page = AdListTemplate {
        nav: user.nav(&req),
        ads: ads.iter().map(|ad| AdRow::new(ad, user.id(), &favorites, now)).collect(),
        search,
    };
    render(&page)
}

/// Renders one ad with its comments and a blank comment form.
pub async fn detail(
    data: web::Data<AppState>,
    req: HttpRequest,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let ad = ownership::find::<Ad, _>(&*data.repo, path.into_inner()).await?;
    let page = detail_page(&data, &req, &user, &ad, String::new(), Vec::new()).await?;
    render(&page)
}

/// Shared with the comment handler, which re-renders it on a rejected comment.
pub(crate) async fn detail_page(
    data: &AppState,
    req: &HttpRequest,
    user: &MaybeUser,
    ad: &Ad,
    comment_text: String,
    comment_errors: Vec<String>,
) -> ApiResult<AdDetailTemplate> {
    let comments = data.repo.comments_for_ad(ad.id).await?;
    let now = Utc::now();
    Ok(AdDetailTemplate {
        nav: user.nav(req),
        ad: AdView::new(ad, user.id(), now),
        comments: comments.iter().map(|c| CommentRow::new(c, user.id(), now)).collect(),
        comment_text,
        comment_errors,
    })
}

pub async fn create_form(data: web::Data<AppState>, req: HttpRequest, user: CurrentUser) -> ApiResult<HttpResponse> {
    let page = AdFormTemplate::new(
        user.nav(&req),
        "Create Ad",
        "/ads/create",
        &AdInput::default(),
        data.config.max_upload_bytes,
    );
    render(&page)
}

pub async fn create(
    data: web::Data<AppState>,
    req: HttpRequest,
    user: CurrentUser,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let max_bytes = data.config.max_upload_bytes;
    let submission = read_ad_form(payload, max_bytes).await?;
    user.verify_csrf(&submission.csrf_token)?;

    let shown = submission.input.clone();
    match submission.input.validate(max_bytes) {
        Ok(draft) => {
            ownership::create::<Ad, _>(&*data.repo, user.user.id, draft).await?;
            Ok(see_other("/ads"))
        }
        Err(errors) => {
            let page = AdFormTemplate::new(user.nav(&req), "Create Ad", "/ads/create", &shown, max_bytes)
                .with_errors(errors);
            render(&page)
        }
    }
}

/// The update form, pre-filled. Non-owners get 404.
pub async fn update_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let ad = ownership::find_owned::<Ad, _>(&*data.repo, path.into_inner(), user.user.id).await?;
    let page = AdFormTemplate::new(
        user.nav(&req),
        "Update Ad",
        &format!("/ads/{}/update", ad.id),
        &AdInput::from_ad(&ad),
        data.config.max_upload_bytes,
    )
    .with_existing_picture(ad.has_picture());
    render(&page)
}

pub async fn update(
    data: web::Data<AppState>,
    req: HttpRequest,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let ad = ownership::find_owned::<Ad, _>(&*data.repo, path.into_inner(), user.user.id).await?;

    let max_bytes = data.config.max_upload_bytes;
    let submission = read_ad_form(payload, max_bytes).await?;
    user.verify_csrf(&submission.csrf_token)?;

    let shown = submission.input.clone();
    match submission.input.validate(max_bytes) {
        Ok(draft) => {
            ownership::update_owned::<Ad, _>(&*data.repo, ad.id, user.user.id, draft).await?;
            Ok(see_other("/ads"))
        }
        Err(errors) => {
            let page = AdFormTemplate::new(
                user.nav(&req),
                "Update Ad",
                &format!("/ads/{}/update", ad.id),
                &shown,
                max_bytes,
            )
            .with_errors(errors)
            .with_existing_picture(ad.has_picture());
            render(&page)
        }
    }
}

pub async fn delete_confirm(
    data: web::Data<AppState>,
    req: HttpRequest,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let ad = ownership::find_owned::<Ad, _>(&*data.repo, path.into_inner(), user.user.id).await?;
    let page = ConfirmDeleteTemplate {
        nav: user.nav(&req),
        kind: "Ad".into(),
        label: ad.title.clone(),
        action: format!("/ads/{}/delete", ad.id),
        cancel: format!("/ads/{}", ad.id),
    };
    render(&page)
}

/// Removes the ad. Comments, favorites and tag links go with it.
pub async fn delete(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    form: web::Form<CsrfForm>,
) -> ApiResult<HttpResponse> {
    user.verify_csrf(&form.csrf_token)?;
    ownership::delete_owned::<Ad, _>(&*data.repo, path.into_inner(), user.user.id).await?;
    Ok(see_other("/ads"))
}

/// Streams the stored picture bytes with their recorded content type.
pub async fn picture(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let ad_id = path.into_inner();
    let picture = data
        .repo
        .get_picture(ad_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Picture".into(), ad_id.to_string()))?;

    let content_type = if picture.content_type.is_empty() {
        "application/octet-stream".to_string()
    } else {
        picture.content_type
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::CONTENT_LENGTH, picture.data.len()))
        .body(picture.data))
}
