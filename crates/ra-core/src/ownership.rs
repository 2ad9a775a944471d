//! # Ownership-scoped CRUD
//!
//! Generic lookups and mutations for any `Owned` entity. Anything that
//! fails the owner check is reported exactly like a missing row, so a
//! caller cannot tell "not yours" from "not there".

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::traits::{EditableRepo, Owned, OwnedRepo};

fn not_found<T: Owned>(id: Uuid) -> AppError {
    AppError::NotFound(T::KIND.to_string(), id.to_string())
}

/// Fetch by id, for anyone.
pub async fn find<T, R>(repo: &R, id: Uuid) -> Result<T>
where
    T: Owned,
    R: OwnedRepo<T> + ?Sized,
{
    repo.find(id).await?.ok_or_else(|| not_found::<T>(id))
}

/// Fetch by id, only if `user_id` owns it.
pub async fn find_owned<T, R>(repo: &R, id: Uuid, user_id: Uuid) -> Result<T>
where
    T: Owned,
    R: OwnedRepo<T> + ?Sized,
{
    match repo.find(id).await? {
        Some(entity) if entity.is_owned_by(user_id) => Ok(entity),
        Some(_) => {
            log::warn!("{} {} requested by non-owner {}", T::KIND, id, user_id);
            Err(not_found::<T>(id))
        }
        None => Err(not_found::<T>(id)),
    }
}

/// Persist a new entity owned by `user_id`.
pub async fn create<T, R>(repo: &R, user_id: Uuid, draft: T::Draft) -> Result<T>
where
    T: Owned,
    R: OwnedRepo<T> + ?Sized,
{
    let entity = repo.insert(user_id, draft).await?;
    log::info!("{} {} created by {}", T::KIND, entity.id(), user_id);
    Ok(entity)
}

/// Replace the editable part of an entity `user_id` owns.
pub async fn update_owned<T, R>(repo: &R, id: Uuid, user_id: Uuid, draft: T::Draft) -> Result<()>
where
    T: Owned,
    R: EditableRepo<T> + ?Sized,
{
    if !repo.update(id, user_id, draft).await? {
        return Err(not_found::<T>(id));
    }
    log::info!("{} {} updated by {}", T::KIND, id, user_id);
    Ok(())
}

/// Delete an entity `user_id` owns. Returns the entity as it was, so
/// callers can redirect relative to it.
pub async fn delete_owned<T, R>(repo: &R, id: Uuid, user_id: Uuid) -> Result<T>
where
    T: Owned,
    R: OwnedRepo<T> + ?Sized,
{
    let entity = find_owned::<T, R>(repo, id, user_id).await?;
    if !repo.remove(id, user_id).await? {
        return Err(not_found::<T>(id));
    }
    log::info!("{} {} deleted by {}", T::KIND, id, user_id);
    Ok(entity)
}
