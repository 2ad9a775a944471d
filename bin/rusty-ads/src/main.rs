//! # Rusty-Ads Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod settings;

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use ra_api::middleware::{security_headers, standard_middleware};
use ra_api::{configure_routes, AppState, WebConfig};

// Feature-gated imports: each plugin is compiled in on demand
#[cfg(feature = "db-sqlite")]
use ra_db_sqlite::SqliteRepo;

#[cfg(feature = "auth-simple")]
use ra_auth_simple::SimpleAuthProvider;

use settings::Settings;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteRepo::new(&settings.database_url)
        .await
        .context("Failed to init SQLite")?;

    // 2. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new();

    // 3. Wrap in AppState (dynamic dispatch over the plugin traits)
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        auth: Box::new(auth),
        config: WebConfig {
            max_upload_bytes: settings.max_upload_bytes,
            secure_cookies: settings.secure_cookies,
            ..WebConfig::default()
        },
    });

    let static_dir = settings.static_dir.clone();

    log::info!("Rusty-Ads starting on http://{}", settings.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(security_headers())
            .app_data(state.clone())
            .service(Files::new("/static", &static_dir))
            .configure(configure_routes)
    })
    .bind(&settings.bind_addr)
    .with_context(|| format!("Failed to bind {}", settings.bind_addr))?
    .run()
    .await
    .context("Server error")
}
