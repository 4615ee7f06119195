//! Backend for a real-estate marketing site: public read endpoints for the
//! site, a cookie-session admin API for content management, pluggable
//! storage and an image upload pipeline.

pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;
pub mod state;
pub mod storage;

use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::UploadMode;
use crate::entities::{
    AboutSection, ApiEntity, City, Condominium, Contact, Employee, HeroSettings, Project,
    Property, PropertyCategory,
};
use crate::handlers::crud;
use crate::state::AppState;

fn public_entity_routes<E: ApiEntity>() -> Router<AppState> {
    Router::new()
        .route(&format!("/api/{}", E::PATH), get(crud::list::<E>))
        .route(&format!("/api/{}/:id", E::PATH), get(crud::get::<E>))
}

fn admin_entity_routes<E: ApiEntity>() -> Router<AppState> {
    Router::new()
        .route(&format!("/api/{}", E::PATH), post(crud::create::<E>))
        .route(
            &format!("/api/{}/:id", E::PATH),
            put(crud::update::<E>).delete(crud::remove::<E>),
        )
}

/// Everything reachable without a session: site reads, contact form, login.
fn public_routes() -> Router<AppState> {
    Router::new()
        .merge(public_entity_routes::<Property>())
        .merge(public_entity_routes::<Project>())
        .merge(public_entity_routes::<Condominium>())
        .merge(public_entity_routes::<PropertyCategory>())
        .merge(public_entity_routes::<City>())
        .merge(public_entity_routes::<AboutSection>())
        .merge(public_entity_routes::<Employee>())
        .route("/api/hero-settings", get(handlers::hero::active))
        .route("/api/contacts", post(crud::create::<Contact>))
        .route("/api/login", post(handlers::auth::login))
}

/// Everything behind the session guard: content mutations, contact inbox,
/// account management, uploads and database operations.
fn admin_routes(state: AppState) -> Router<AppState> {
    let upload_limit =
        state.config.upload.max_files * state.config.upload.max_file_bytes + 1024 * 1024;

    Router::new()
        .merge(admin_entity_routes::<Property>())
        .merge(admin_entity_routes::<Project>())
        .merge(admin_entity_routes::<Condominium>())
        .merge(admin_entity_routes::<PropertyCategory>())
        .merge(admin_entity_routes::<City>())
        .merge(admin_entity_routes::<AboutSection>())
        .merge(admin_entity_routes::<Employee>())
        .route("/api/hero-settings", post(crud::create::<HeroSettings>))
        .route(
            "/api/hero-settings/latest",
            get(handlers::hero::latest),
        )
        .route(
            "/api/hero-settings/:id",
            put(crud::update::<HeroSettings>).delete(crud::remove::<HeroSettings>),
        )
        .route("/api/contacts", get(crud::list::<Contact>))
        .route(
            "/api/contacts/:id",
            get(crud::get::<Contact>).delete(crud::remove::<Contact>),
        )
        .route("/api/user", get(handlers::auth::current_user))
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/change-password", post(handlers::auth::change_password))
        .route(
            "/api/upload/images",
            post(handlers::upload::upload_images).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/upload/images/:filename",
            delete(handlers::upload::delete_image),
        )
        .route("/api/database/status", get(handlers::admin::database_status))
        .route("/api/database/migrate", post(handlers::admin::migrate_database))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ))
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/sitemap.xml", get(handlers::sitemap::sitemap))
        .merge(public_routes())
        .merge(admin_routes(state.clone()));

    if state.config.upload.mode == UploadMode::Disk {
        app = app.nest_service("/uploads", ServeDir::new(&state.config.upload.dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
