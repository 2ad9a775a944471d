//! # seed
//!
//! Creates a login account: `seed <username> <password>`.
//! Uses the same `RUSTY_ADS_DATABASE_URL` as the server.

use anyhow::{bail, Context};
use config::{Config, Environment};
use ra_auth_simple::SimpleAuthProvider;
use ra_core::traits::{AuthProvider, UserRepo};
use ra_db_sqlite::SqliteRepo;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SeedSettings {
    database_url: String,
}

fn load_settings() -> anyhow::Result<SeedSettings> {
    Config::builder()
        .set_default("database_url", "sqlite:rusty_ads.db")?
        .add_source(Environment::with_prefix("RUSTY_ADS"))
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let mut args = std::env::args().skip(1);
    let (Some(username), Some(password), None) = (args.next(), args.next(), args.next()) else {
        bail!("usage: seed <username> <password>");
    };
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        bail!("username and password must not be empty");
    }

    let settings = load_settings()?;
    let repo = SqliteRepo::new(&settings.database_url).await?;
    let hash = SimpleAuthProvider::new().hash_password(&password)?;

    let user = repo
        .create_user(username, &hash)
        .await
        .with_context(|| format!("Could not create user '{username}'"))?;
    log::info!("Created user {} ({})", user.username, user.id);
    Ok(())
}
