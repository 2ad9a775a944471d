//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::forms::{AdDraft, CommentDraft};
use crate::models::{Ad, Comment, Fav, Picture, Session, User};

/// An entity with a single owning user.
///
/// `Draft` is the validated input that creates or replaces the
/// user-editable part of the entity.
pub trait Owned: Send + Sync + 'static {
    type Draft: Send + Sync + 'static;

    /// Human-readable kind, used in not-found errors.
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;

    fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id() == user_id
    }
}

impl Owned for Ad {
    type Draft = AdDraft;
    const KIND: &'static str = "Ad";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Comment {
    type Draft = CommentDraft;
    const KIND: &'static str = "Comment";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Storage accessor for an owned entity.
///
/// Mutations are scoped by owner at the store level: they return
/// `false` when no row matched both the id and the owner.
#[async_trait]
pub trait OwnedRepo<T: Owned>: Send + Sync {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<T>>;
    async fn insert(&self, owner_id: Uuid, draft: T::Draft) -> anyhow::Result<T>;
    async fn remove(&self, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool>;
}

/// Owned entities that can be edited after creation. Comments cannot,
/// so only ads implement this.
#[async_trait]
pub trait EditableRepo<T: Owned>: OwnedRepo<T> {
    /// Owner-scoped like `OwnedRepo::remove`.
    async fn update(&self, id: Uuid, owner_id: Uuid, draft: T::Draft) -> anyhow::Result<bool>;
}

/// Ad-specific queries on top of the owned CRUD.
#[async_trait]
pub trait AdRepo: EditableRepo<Ad> {
    /// Newest-updated first. `search` matches title or text,
    /// case-insensitively and literally.
    async fn list_ads(&self, search: Option<&str>, limit: i64) -> anyhow::Result<Vec<Ad>>;

    /// Loads the stored picture bytes, if the ad has any.
    async fn get_picture(&self, ad_id: Uuid) -> anyhow::Result<Option<Picture>>;
}

#[async_trait]
pub trait CommentRepo: OwnedRepo<Comment> {
    /// Comments on one ad, newest-updated first.
    async fn comments_for_ad(&self, ad_id: Uuid) -> anyhow::Result<Vec<Comment>>;
}

/// Favorites are idempotent by contract: both calls succeed whatever
/// the prior state was.
#[async_trait]
pub trait FavoriteRepo: Send + Sync {
    async fn ensure_favorited(&self, fav: Fav) -> anyhow::Result<()>;
    async fn ensure_unfavorited(&self, fav: Fav) -> anyhow::Result<()>;
    async fn favorite_ad_ids(&self, user_id: Uuid) -> anyhow::Result<HashSet<Uuid>>;
}

/// Accounts and login sessions.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `AppError::Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn create_session(&self, session: Session) -> anyhow::Result<()>;
    /// Returns the session and its user, ignoring expired sessions.
    async fn find_session(&self, token: &str) -> anyhow::Result<Option<(Session, User)>>;
    async fn delete_session(&self, token: &str) -> anyhow::Result<()>;
}

/// Everything the web layer needs from persistence, as one object.
pub trait ClassifiedsRepo: AdRepo + CommentRepo + FavoriteRepo + UserRepo {}

impl<R> ClassifiedsRepo for R where R: AdRepo + CommentRepo + FavoriteRepo + UserRepo {}

/// Identity contract: password hashing and token generation.
pub trait AuthProvider: Send + Sync {
    /// Produces a salted hash suitable for `User::password_hash`.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// A fresh unguessable token for sessions and CSRF.
    fn generate_token(&self) -> anyhow::Result<String>;
}
