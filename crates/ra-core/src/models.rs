//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Ads.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Owns ads and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2 PHC string produced by the `AuthProvider`
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A logged-in browser session, keyed by the cookie token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    /// Echoed back by every authenticated form
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A classified listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub id: Uuid,
    pub title: String,
    /// Price in cents; `None` means "no price given"
    pub price_cents: Option<i64>,
    pub text: String,
    pub owner_id: Uuid,
    /// Joined from `users` for display
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// MIME type recorded at upload time
    pub content_type: Option<String>,
    /// Byte length of the stored picture. The bytes themselves are only
    /// loaded by the streaming endpoint.
    pub picture_size: Option<i64>,
    pub tags: Vec<String>,
}

impl Ad {
    pub fn has_picture(&self) -> bool {
        self.picture_size.is_some()
    }

    /// Renders the price as "12.50", or an empty string when unset.
    pub fn price_display(&self) -> String {
        self.price_cents.map(format_cents).unwrap_or_default()
    }
}

/// Formats a cent amount as a fixed two-decimal string.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// The binary payload served by the picture endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A remark left by any user on any ad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Short label used on the delete confirmation page.
    pub fn preview(&self) -> String {
        if self.text.chars().count() < 15 {
            self.text.clone()
        } else {
            let head: String = self.text.chars().take(15).collect();
            format!("{head}...")
        }
    }
}

/// A user's bookmark of an ad. At most one per (ad, user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fav {
    pub ad_id: Uuid,
    pub user_id: Uuid,
}
