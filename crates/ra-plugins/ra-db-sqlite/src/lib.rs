//! # ra-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `ra-core` domain models.

use std::collections::HashSet;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use ra_core::error::{AppError, Result};
use ra_core::forms::{AdDraft, CommentDraft};
use ra_core::models::{Ad, Comment, Fav, Picture, Session, User};
use ra_core::traits::{AdRepo, CommentRepo, EditableRepo, FavoriteRepo, OwnedRepo, UserRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

const AD_SELECT: &str = "SELECT a.id, a.title, a.price_cents, a.text, a.owner_id, \
     u.username AS owner_name, a.created_at, a.updated_at, a.content_type, \
     length(a.picture) AS picture_size \
     FROM ads a JOIN users u ON u.id = a.owner_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.ad_id, c.owner_id, u.username AS owner_name, \
     c.text, c.created_at, c.updated_at \
     FROM comments c JOIN users u ON u.id = c.owner_id";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Uuid::from_slice(blob).context("malformed uuid column")
}

fn uuid_column(row: &SqliteRow, column: &str) -> anyhow::Result<Uuid> {
    blob_to_uuid(row.try_get::<Vec<u8>, _>(column)?.as_slice())
}

/// Lowercased title and text as stored in `ads.search_text`.
fn search_text(title: &str, text: &str) -> String {
    format!("{}\n{}", title.to_lowercase(), text.to_lowercase())
}

/// Escapes LIKE wildcards so the search term is matched literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn row_to_ad(row: &SqliteRow) -> anyhow::Result<Ad> {
    Ok(Ad {
        id: uuid_column(row, "id")?,
        title: row.try_get("title")?,
        price_cents: row.try_get("price_cents")?,
        text: row.try_get("text")?,
        owner_id: uuid_column(row, "owner_id")?,
        owner_name: row.try_get("owner_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        content_type: row.try_get("content_type")?,
        picture_size: row.try_get("picture_size")?,
        tags: Vec::new(),
    })
}

fn row_to_comment(row: &SqliteRow) -> anyhow::Result<Comment> {
    Ok(Comment {
        id: uuid_column(row, "id")?,
        ad_id: uuid_column(row, "ad_id")?,
        owner_id: uuid_column(row, "owner_id")?,
        owner_name: row.try_get("owner_name")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_user(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: uuid_column(row, "id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Replaces the tag links of one ad. Runs inside the caller's transaction.
async fn replace_tags(conn: &mut SqliteConnection, ad_id: Uuid, tags: &[String]) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM ad_tags WHERE ad_id = ?")
        .bind(uuid_to_blob(ad_id))
        .execute(&mut *conn)
        .await?;

    for tag in tags {
        sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(tag)
            .execute(&mut *conn)
            .await?;
        sqlx::query("INSERT INTO ad_tags (ad_id, tag_id) SELECT ?, id FROM tags WHERE name = ?")
            .bind(uuid_to_blob(ad_id))
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl SqliteRepo {
    /// Connects and runs the embedded migrations.
    ///
    /// # Developer Note
    /// Every connection to `sqlite::memory:` opens its own empty database,
    /// so in-memory URLs get a single connection that is never recycled.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        log::info!("SQLite ready at {}", database_url);
        Ok(Self { pool })
    }

    async fn load_tags(&self, ad_id: Uuid) -> anyhow::Result<Vec<String>> {
        let tags = sqlx::query_scalar::<_, String>(
            "SELECT t.name FROM tags t JOIN ad_tags at ON at.tag_id = t.id WHERE at.ad_id = ? ORDER BY t.name",
        )
        .bind(uuid_to_blob(ad_id))
        .fetch_all(&self.pool)
        .await
        .context("Failed to load tags")?;
        Ok(tags)
    }

    async fn fetch_ad(&self, id: Uuid) -> anyhow::Result<Option<Ad>> {
        let row = sqlx::query(&format!("{AD_SELECT} WHERE a.id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch ad")?;

        match row {
            Some(row) => {
                let mut ad = row_to_ad(&row)?;
                ad.tags = self.load_tags(ad.id).await?;
                Ok(Some(ad))
            }
            None => Ok(None),
        }
    }

    async fn fetch_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch comment")?;
        row.as_ref().map(row_to_comment).transpose()
    }
}

#[async_trait]
impl OwnedRepo<Ad> for SqliteRepo {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Ad>> {
        self.fetch_ad(id).await
    }

    /// Inserts the ad and its tag links in one transaction.
    async fn insert(&self, owner_id: Uuid, draft: AdDraft) -> anyhow::Result<Ad> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let (picture, content_type) = match draft.picture {
            Some(p) => (Some(p.data), Some(p.content_type)),
            None => (None, None),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO ads (id, title, price_cents, text, search_text, owner_id, created_at, updated_at, \
             picture, content_type) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(id))
        .bind(&draft.title)
        .bind(draft.price_cents)
        .bind(&draft.text)
        .bind(search_text(&draft.title, &draft.text))
        .bind(uuid_to_blob(owner_id))
        .bind(now)
        .bind(now)
        .bind(picture)
        .bind(content_type)
        .execute(&mut *tx)
        .await
        .context("Failed to insert ad")?;

        replace_tags(&mut tx, id, &draft.tags).await?;
        tx.commit().await?;

        self.fetch_ad(id).await?.context("ad missing right after insert")
    }

    /// Comments, favorites and tag links go with it (ON DELETE CASCADE).
    async fn remove(&self, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM ads WHERE id = ? AND owner_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(owner_id))
            .execute(&self.pool)
            .await
            .context("Failed to delete ad")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EditableRepo<Ad> for SqliteRepo {
    /// Scoped by owner. A draft without a picture leaves the stored one alone.
    async fn update(&self, id: Uuid, owner_id: Uuid, draft: AdDraft) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let search = search_text(&draft.title, &draft.text);

        let result = match draft.picture {
            Some(picture) => sqlx::query(
                "UPDATE ads SET title = ?, price_cents = ?, text = ?, search_text = ?, updated_at = ?, \
                 picture = ?, content_type = ? WHERE id = ? AND owner_id = ?",
            )
            .bind(&draft.title)
            .bind(draft.price_cents)
            .bind(&draft.text)
            .bind(search)
            .bind(Utc::now())
            .bind(picture.data)
            .bind(picture.content_type)
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(owner_id))
            .execute(&mut *tx)
            .await,
            None => sqlx::query(
                "UPDATE ads SET title = ?, price_cents = ?, text = ?, search_text = ?, updated_at = ? \
                 WHERE id = ? AND owner_id = ?",
            )
            .bind(&draft.title)
            .bind(draft.price_cents)
            .bind(&draft.text)
            .bind(search)
            .bind(Utc::now())
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(owner_id))
            .execute(&mut *tx)
            .await,
        }
        .context("Failed to update ad")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        replace_tags(&mut tx, id, &draft.tags).await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl AdRepo for SqliteRepo {
    async fn list_ads(&self, search: Option<&str>, limit: i64) -> anyhow::Result<Vec<Ad>> {
        let rows = match search {
            Some(term) => {
                sqlx::query(&format!(
                    "{AD_SELECT} WHERE a.search_text LIKE ? ESCAPE '\\' \
                     ORDER BY a.updated_at DESC, a.id DESC LIMIT ?"
                ))
                .bind(like_pattern(&term.to_lowercase()))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{AD_SELECT} ORDER BY a.updated_at DESC, a.id DESC LIMIT ?"))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to list ads")?;

        let mut ads = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut ad = row_to_ad(row)?;
            ad.tags = self.load_tags(ad.id).await?;
            ads.push(ad);
        }
        Ok(ads)
    }

    async fn get_picture(&self, ad_id: Uuid) -> anyhow::Result<Option<Picture>> {
        let row = sqlx::query("SELECT picture, content_type FROM ads WHERE id = ?")
            .bind(uuid_to_blob(ad_id))
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch picture")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: Option<Vec<u8>> = row.try_get("picture")?;
        let content_type: Option<String> = row.try_get("content_type")?;

        Ok(data.map(|data| Picture {
            content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            data,
        }))
    }
}

#[async_trait]
impl OwnedRepo<Comment> for SqliteRepo {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        self.fetch_comment(id).await
    }

    async fn insert(&self, owner_id: Uuid, draft: CommentDraft) -> anyhow::Result<Comment> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO comments (id, ad_id, owner_id, text, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(id))
        .bind(uuid_to_blob(draft.ad_id))
        .bind(uuid_to_blob(owner_id))
        .bind(&draft.text)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert comment")?;

        self.fetch_comment(id).await?.context("comment missing right after insert")
    }

    async fn remove(&self, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ? AND owner_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(owner_id))
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CommentRepo for SqliteRepo {
    async fn comments_for_ad(&self, ad_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{COMMENT_SELECT} WHERE c.ad_id = ? ORDER BY c.updated_at DESC, c.id DESC"
        ))
        .bind(uuid_to_blob(ad_id))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;
        rows.iter().map(row_to_comment).collect()
    }
}

#[async_trait]
impl FavoriteRepo for SqliteRepo {
    /// The primary key on (ad_id, user_id) makes a repeat a no-op.
    async fn ensure_favorited(&self, fav: Fav) -> anyhow::Result<()> {
        sqlx::query("INSERT OR IGNORE INTO favs (ad_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(uuid_to_blob(fav.ad_id))
            .bind(uuid_to_blob(fav.user_id))
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to favorite ad")?;
        Ok(())
    }

    async fn ensure_unfavorited(&self, fav: Fav) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM favs WHERE ad_id = ? AND user_id = ?")
            .bind(uuid_to_blob(fav.ad_id))
            .bind(uuid_to_blob(fav.user_id))
            .execute(&self.pool)
            .await
            .context("Failed to unfavorite ad")?;
        Ok(())
    }

    async fn favorite_ad_ids(&self, user_id: Uuid) -> anyhow::Result<HashSet<Uuid>> {
        let blobs = sqlx::query_scalar::<_, Vec<u8>>("SELECT ad_id FROM favs WHERE user_id = ?")
            .bind(uuid_to_blob(user_id))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list favorites")?;
        blobs.iter().map(|b| blob_to_uuid(b)).collect()
    }
}

#[async_trait]
impl UserRepo for SqliteRepo {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let inserted = sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict(format!("username {username} is already taken")))
            }
            Err(e) => Err(AppError::Internal(format!("Failed to create user: {e}"))),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, password_hash, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Expired sessions are pruned here, the only place new ones appear.
    async fn create_session(&self, session: Session) -> anyhow::Result<()> {
        let pruned = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to prune expired sessions")?;
        if pruned.rows_affected() > 0 {
            log::debug!("Pruned {} expired sessions", pruned.rows_affected());
        }

        sqlx::query(
            "INSERT INTO sessions (token, user_id, csrf_token, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(uuid_to_blob(session.user_id))
        .bind(&session.csrf_token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to create session")?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> anyhow::Result<Option<(Session, User)>> {
        let row = sqlx::query(
            "SELECT s.token, s.csrf_token, s.created_at AS session_created_at, s.expires_at, \
             u.id, u.username, u.password_hash, u.created_at \
             FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token = ? AND s.expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch session")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = row_to_user(&row)?;
        let session = Session {
            token: row.try_get("token")?,
            user_id: user.id,
            csrf_token: row.try_get("csrf_token")?,
            created_at: row.try_get("session_created_at")?,
            expires_at: row.try_get("expires_at")?,
        };
        Ok(Some((session, user)))
    }

    async fn delete_session(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ra_core::ownership;

    async fn repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    async fn user(repo: &SqliteRepo, name: &str) -> User {
        repo.create_user(name, "not-a-real-hash").await.unwrap()
    }

    fn draft(title: &str, text: &str) -> AdDraft {
        AdDraft {
            title: title.into(),
            price_cents: Some(1500),
            text: text.into(),
            tags: Vec::new(),
            picture: None,
        }
    }

    async fn post_ad(repo: &SqliteRepo, owner: &User, title: &str, text: &str) -> Ad {
        ownership::create::<Ad, _>(repo, owner.id, draft(title, text)).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_ad_with_tags() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;

        let mut d = draft("Road bike", "Carbon frame");
        d.tags = vec!["bike".into(), "sport".into()];
        let ad = ownership::create::<Ad, _>(&repo, alice.id, d).await.unwrap();

        let fetched = ownership::find::<Ad, _>(&repo, ad.id).await.unwrap();
        assert_eq!(fetched.title, "Road bike");
        assert_eq!(fetched.owner_name, "alice");
        assert_eq!(fetched.price_cents, Some(1500));
        assert_eq!(fetched.tags, vec!["bike", "sport"]);
        assert!(!fetched.has_picture());
    }

    #[tokio::test]
    async fn test_search_matches_body_case_insensitively() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let couch = post_ad(&repo, &alice, "Couch", "Comfy GREEN velvet").await;
        post_ad(&repo, &alice, "Table", "Walnut").await;

        let found = repo.list_ads(Some("green"), 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, couch.id);

        let by_title = repo.list_ads(Some("tAbLe"), 10).await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Table");
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let jacket = post_ad(&repo, &alice, "Jacke", "Ärmel ÉTÉ").await;
        post_ad(&repo, &alice, "Hose", "Winter").await;

        let found = repo.list_ads(Some("été"), 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, jacket.id);
        assert_eq!(repo.list_ads(Some("ärmel"), 10).await.unwrap().len(), 1);
        assert_eq!(repo.list_ads(Some("JACKE"), 10).await.unwrap().len(), 1);

        ownership::update_owned::<Ad, _>(&repo, jacket.id, alice.id, draft("Jacke", "Übergröße"))
            .await
            .unwrap();
        assert!(repo.list_ads(Some("été"), 10).await.unwrap().is_empty());
        assert_eq!(repo.list_ads(Some("ÜBER"), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        post_ad(&repo, &alice, "Sale", "everything 50% off").await;
        post_ad(&repo, &alice, "Lamp", "brass").await;

        assert_eq!(repo.list_ads(Some("%"), 10).await.unwrap().len(), 1);
        assert_eq!(repo.list_ads(Some("_"), 10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_updated_first_and_capped() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let mut ids = Vec::new();
        for i in 0..12 {
            ids.push(post_ad(&repo, &alice, &format!("Ad {i}"), "body").await.id);
        }

        let listed = repo.list_ads(None, 10).await.unwrap();
        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0].id, ids[11]);

        // Touching the oldest ad moves it to the front.
        ownership::update_owned::<Ad, _>(&repo, ids[0], alice.id, draft("Ad 0 again", "body"))
            .await
            .unwrap();
        let listed = repo.list_ads(None, 10).await.unwrap();
        assert_eq!(listed[0].id, ids[0]);
        assert_eq!(listed[0].title, "Ad 0 again");
    }

    #[tokio::test]
    async fn test_update_and_delete_are_scoped_by_owner() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let ad = post_ad(&repo, &alice, "Guitar", "Six strings").await;

        let updated = EditableRepo::<Ad>::update(&repo, ad.id, bob.id, draft("Stolen", "mine now"))
            .await
            .unwrap();
        assert!(!updated);
        assert!(!OwnedRepo::<Ad>::remove(&repo, ad.id, bob.id).await.unwrap());

        let unchanged = repo.fetch_ad(ad.id).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "Guitar");
    }

    #[tokio::test]
    async fn test_update_keeps_picture_unless_replaced() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let mut d = draft("Photo", "has a picture");
        d.picture = Some(Picture {
            content_type: "image/png".into(),
            data: vec![1, 2, 3, 4],
        });
        let ad = ownership::create::<Ad, _>(&repo, alice.id, d).await.unwrap();
        assert_eq!(ad.picture_size, Some(4));
        assert_eq!(ad.content_type.as_deref(), Some("image/png"));

        ownership::update_owned::<Ad, _>(&repo, ad.id, alice.id, draft("Photo", "edited"))
            .await
            .unwrap();
        let picture = repo.get_picture(ad.id).await.unwrap().unwrap();
        assert_eq!(picture.data, vec![1, 2, 3, 4]);

        let mut replace = draft("Photo", "new picture");
        replace.picture = Some(Picture {
            content_type: "image/gif".into(),
            data: vec![9; 10],
        });
        ownership::update_owned::<Ad, _>(&repo, ad.id, alice.id, replace).await.unwrap();
        let picture = repo.get_picture(ad.id).await.unwrap().unwrap();
        assert_eq!(picture.content_type, "image/gif");
        assert_eq!(picture.data.len(), 10);
    }

    #[tokio::test]
    async fn test_ad_without_picture_streams_nothing() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let ad = post_ad(&repo, &alice, "Plain", "no picture").await;
        assert!(repo.get_picture(ad.id).await.unwrap().is_none());
        assert!(repo.get_picture(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comments_newest_first_and_cascade_on_ad_delete() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let ad = post_ad(&repo, &alice, "Kayak", "Two seats").await;

        let first = ownership::create::<Comment, _>(
            &repo,
            bob.id,
            CommentDraft { ad_id: ad.id, text: "Still available?".into() },
        )
        .await
        .unwrap();
        let second = ownership::create::<Comment, _>(
            &repo,
            alice.id,
            CommentDraft { ad_id: ad.id, text: "Yes it is".into() },
        )
        .await
        .unwrap();
        assert_eq!(first.owner_name, "bob");

        let comments = repo.comments_for_ad(ad.id).await.unwrap();
        assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        repo.ensure_favorited(Fav { ad_id: ad.id, user_id: bob.id }).await.unwrap();
        ownership::delete_owned::<Ad, _>(&repo, ad.id, alice.id).await.unwrap();

        assert!(repo.comments_for_ad(ad.id).await.unwrap().is_empty());
        assert!(repo.fetch_comment(first.id).await.unwrap().is_none());
        assert!(repo.favorite_ad_ids(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_remove_scoped_by_owner() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let ad = post_ad(&repo, &alice, "Tent", "Sleeps four").await;
        let comment = ownership::create::<Comment, _>(
            &repo,
            bob.id,
            CommentDraft { ad_id: ad.id, text: "How heavy?".into() },
        )
        .await
        .unwrap();

        assert!(!OwnedRepo::<Comment>::remove(&repo, comment.id, alice.id).await.unwrap());
        assert!(repo.fetch_comment(comment.id).await.unwrap().is_some());
        assert!(OwnedRepo::<Comment>::remove(&repo, comment.id, bob.id).await.unwrap());
        assert!(repo.fetch_comment(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_favorites_are_idempotent() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let ad = post_ad(&repo, &alice, "Drone", "4K camera").await;

        repo.ensure_favorited(Fav { ad_id: ad.id, user_id: bob.id }).await.unwrap();
        repo.ensure_favorited(Fav { ad_id: ad.id, user_id: bob.id }).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favs")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(repo.favorite_ad_ids(bob.id).await.unwrap().contains(&ad.id));
        assert!(repo.favorite_ad_ids(alice.id).await.unwrap().is_empty());

        repo.ensure_unfavorited(Fav { ad_id: ad.id, user_id: bob.id }).await.unwrap();
        repo.ensure_unfavorited(Fav { ad_id: ad.id, user_id: bob.id }).await.unwrap();
        assert!(repo.favorite_ad_ids(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = repo().await;
        user(&repo, "alice").await;
        let err = repo.create_user("alice", "x").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(repo.find_user_by_username("alice").await.unwrap().is_some());
        assert!(repo.find_user_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sessions_expire() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let now = Utc::now();

        let live = Session {
            token: "live-token".into(),
            user_id: alice.id,
            csrf_token: "csrf".into(),
            created_at: now,
            expires_at: now + Duration::days(14),
        };
        let stale = Session {
            token: "stale-token".into(),
            expires_at: now - Duration::seconds(1),
            ..live.clone()
        };
        repo.create_session(live).await.unwrap();
        repo.create_session(stale).await.unwrap();

        let (session, user) = repo.find_session("live-token").await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(session.csrf_token, "csrf");
        assert!(repo.find_session("stale-token").await.unwrap().is_none());

        repo.delete_session("live-token").await.unwrap();
        assert!(repo.find_session("live-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_creating_a_session_prunes_expired_ones() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let now = Utc::now();

        let stale = Session {
            token: "stale-token".into(),
            user_id: alice.id,
            csrf_token: "csrf".into(),
            created_at: now - Duration::days(15),
            expires_at: now - Duration::days(1),
        };
        repo.create_session(stale.clone()).await.unwrap();
        repo.create_session(Session {
            token: "fresh-token".into(),
            created_at: now,
            expires_at: now + Duration::days(14),
            ..stale
        })
        .await
        .unwrap();

        let tokens: Vec<String> = sqlx::query_scalar("SELECT token FROM sessions")
            .fetch_all(&repo.pool)
            .await
            .unwrap();
        assert_eq!(tokens, vec!["fresh-token"]);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("bike"), "%bike%");
        assert_eq!(like_pattern("50%_\\"), "%50\\%\\_\\\\%");
    }
}
