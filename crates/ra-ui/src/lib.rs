//! # ra-ui
//!
//! Askama templates and the flat view models they render. Everything a
//! template touches is pre-formatted here so the templates stay free of logic.

use std::collections::HashSet;

use askama::Template;
use chrono::{DateTime, Utc};
use ra_core::forms::{AdFormErrors, AdInput};
use ra_core::humanize::{naturalsize, naturaltime};
use ra_core::models::{Ad, Comment};
use uuid::Uuid;

/// Who is looking at the page. Rendered by the base layout.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub logged_in: bool,
    pub username: String,
    /// Empty for anonymous visitors
    pub csrf_token: String,
    /// Current path, used as `next` on the login link
    pub path: String,
}

impl Nav {
    pub fn anonymous(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn user(username: &str, csrf_token: &str, path: &str) -> Self {
        Self {
            logged_in: true,
            username: username.to_string(),
            csrf_token: csrf_token.to_string(),
            path: path.to_string(),
        }
    }

    pub fn login_href(&self) -> String {
        login_location(&self.path)
    }
}

/// The login page, remembering where the visitor was going.
pub fn login_location(next: &str) -> String {
    let query = serde_urlencoded::to_string([("next", next)]).unwrap_or_default();
    format!("/login?{query}")
}

/// One line of the ad list.
#[derive(Debug, Clone)]
pub struct AdRow {
    pub id: String,
    pub title: String,
    pub price: String,
    pub owner_name: String,
    pub natural_updated: String,
    pub tags: Vec<String>,
    pub is_owner: bool,
    pub is_favorite: bool,
}

impl AdRow {
    pub fn new(ad: &Ad, viewer: Option<Uuid>, favorites: &HashSet<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: ad.id.to_string(),
            title: ad.title.clone(),
            price: ad.price_display(),
            owner_name: ad.owner_name.clone(),
            natural_updated: naturaltime(ad.updated_at, now),
            tags: ad.tags.clone(),
            is_owner: viewer == Some(ad.owner_id),
            is_favorite: favorites.contains(&ad.id),
        }
    }
}

/// The ad as shown on its detail page.
#[derive(Debug, Clone)]
pub struct AdView {
    pub id: String,
    pub title: String,
    pub price: String,
    pub text: String,
    pub owner_name: String,
    pub natural_updated: String,
    pub has_picture: bool,
    pub picture_size: String,
    pub tags: Vec<String>,
    pub is_owner: bool,
}

impl AdView {
    pub fn new(ad: &Ad, viewer: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: ad.id.to_string(),
            title: ad.title.clone(),
            price: ad.price_display(),
            text: ad.text.clone(),
            owner_name: ad.owner_name.clone(),
            natural_updated: naturaltime(ad.updated_at, now),
            has_picture: ad.has_picture(),
            picture_size: ad
                .picture_size
                .map(|n| naturalsize(n.max(0) as u64))
                .unwrap_or_default(),
            tags: ad.tags.clone(),
            is_owner: viewer == Some(ad.owner_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub text: String,
    pub owner_name: String,
    pub natural_updated: String,
    pub is_owner: bool,
}

impl CommentRow {
    pub fn new(comment: &Comment, viewer: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: comment.id.to_string(),
            text: comment.text.clone(),
            owner_name: comment.owner_name.clone(),
            natural_updated: naturaltime(comment.updated_at, now),
            is_owner: viewer == Some(comment.owner_id),
        }
    }
}

#[derive(Template)]
#[template(path = "ad_list.html")]
pub struct AdListTemplate {
    pub nav: Nav,
    pub ads: Vec<AdRow>,
    /// Echoed back into the search box
    pub search: String,
}

#[derive(Template)]
#[template(path = "ad_detail.html")]
pub struct AdDetailTemplate {
    pub nav: Nav,
    pub ad: AdView,
    pub comments: Vec<CommentRow>,
    pub comment_text: String,
    pub comment_errors: Vec<String>,
}

/// Shared by create and update.
#[derive(Template)]
#[template(path = "ad_form.html")]
pub struct AdFormTemplate {
    pub nav: Nav,
    pub heading: String,
    pub action: String,
    pub title: String,
    pub price: String,
    pub text: String,
    pub tags: String,
    pub errors: AdFormErrors,
    pub has_picture: bool,
    pub max_upload: String,
}

impl AdFormTemplate {
    pub fn new(nav: Nav, heading: &str, action: &str, input: &AdInput, max_upload_bytes: u64) -> Self {
        Self {
            nav,
            heading: heading.to_string(),
            action: action.to_string(),
            title: input.title.clone(),
            price: input.price.clone(),
            text: input.text.clone(),
            tags: input.tags.clone(),
            errors: AdFormErrors::default(),
            has_picture: false,
            max_upload: naturalsize(max_upload_bytes),
        }
    }

    pub fn with_errors(mut self, errors: AdFormErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_existing_picture(mut self, has_picture: bool) -> Self {
        self.has_picture = has_picture;
        self
    }
}

/// Delete confirmation for any owned entity.
#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub nav: Nav,
    pub kind: String,
    pub label: String,
    pub action: String,
    pub cancel: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub error: String,
}
