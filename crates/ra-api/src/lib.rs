//! # ra-api
//!
//! The web routing and orchestration layer for Rusty-Ads.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
mod multipart;

use actix_web::web;

pub use handlers::{AppState, WebConfig};

/// Configures the routes for the classifieds site.
///
/// `/ads/create` is registered before `/ads/{id}` so the literal segment
/// wins over the id pattern.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::home))
        // Ads
        .service(web::resource("/ads").route(web::get().to(handlers::ads::list)))
        .service(
            web::resource("/ads/create")
                .route(web::get().to(handlers::ads::create_form))
                .route(web::post().to(handlers::ads::create)),
        )
        .service(web::resource("/ads/{id}").route(web::get().to(handlers::ads::detail)))
        .service(
            web::resource("/ads/{id}/update")
                .route(web::get().to(handlers::ads::update_form))
                .route(web::post().to(handlers::ads::update)),
        )
        .service(
            web::resource("/ads/{id}/delete")
                .route(web::get().to(handlers::ads::delete_confirm))
                .route(web::post().to(handlers::ads::delete)),
        )
        .service(web::resource("/ads/{id}/picture").route(web::get().to(handlers::ads::picture)))
        // Comments
        .service(web::resource("/ads/{id}/comment").route(web::post().to(handlers::comments::create)))
        .service(
            web::resource("/comments/{id}/delete")
                .route(web::get().to(handlers::comments::delete_confirm))
                .route(web::post().to(handlers::comments::delete)),
        )
        // Favorites
        .service(web::resource("/ads/{id}/favorite").route(web::post().to(handlers::favorites::add)))
        .service(web::resource("/ads/{id}/unfavorite").route(web::post().to(handlers::favorites::remove)))
        // Accounts
        .service(
            web::resource("/login")
                .route(web::get().to(handlers::account::login_form))
                .route(web::post().to(handlers::account::login)),
        )
        .service(web::resource("/logout").route(web::post().to(handlers::account::logout)));
}
