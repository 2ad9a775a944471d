//! Comment creation and owner-only deletion.

use actix_web::{web, HttpRequest, HttpResponse};
use ra_core::forms::CommentInput;
use ra_core::models::{Ad, Comment};
use ra_core::ownership;
use ra_ui::ConfirmDeleteTemplate;
use serde::Deserialize;
use uuid::Uuid;

use super::ads::detail_page;
use super::{render, see_other, AppState, CsrfForm};
use crate::error::ApiResult;
use crate::extract::{CurrentUser, MaybeUser};

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Any logged-in user may comment on any existing ad. A rejected comment
/// re-renders the detail page with the field error.
pub async fn create(
    data: web::Data<AppState>,
    req: HttpRequest,
    user: CurrentUser,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    user.verify_csrf(&form.csrf_token)?;
    let ad = ownership::find::<Ad, _>(&*data.repo, path.into_inner()).await?;

    let input = CommentInput { text: form.comment.clone() };
    match input.validate(ad.id) {
        Ok(draft) => {
            ownership::create::<Comment, _>(&*data.repo, user.user.id, draft).await?;
            Ok(see_other(&format!("/ads/{}", ad.id)))
        }
        Err(errors) => {
            let viewer = MaybeUser(Some(user));
            let page = detail_page(&data, &req, &viewer, &ad, form.comment, errors.text).await?;
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
    let comment = ownership::find_owned::<Comment, _>(&*data.repo, path.into_inner(), user.user.id).await?;
    let page = ConfirmDeleteTemplate {
        nav: user.nav(&req),
        kind: "Comment".into(),
        label: comment.preview(),
        action: format!("/comments/{}/delete", comment.id),
        cancel: format!("/ads/{}", comment.ad_id),
    };
    render(&page)
}

/// Deletes the comment and returns to its ad.
pub async fn delete(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    form: web::Form<CsrfForm>,
) -> ApiResult<HttpResponse> {
    user.verify_csrf(&form.csrf_token)?;
    let comment = ownership::delete_owned::<Comment, _>(&*data.repo, path.into_inner(), user.user.id).await?;
    Ok(see_other(&format!("/ads/{}", comment.ad_id)))
}
