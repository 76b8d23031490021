use std::sync::Arc;

use axum::{middleware, response::IntoResponse, routing::get, Extension, Json, Router};
use rand::Rng;
use serde_json::json;
use tower::ServiceBuilder;
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};

use crate::{
    config::config,
    db::DB,
    identity::{self, IdentityProvider},
    notes, pages, profiles,
    shared::views::{environment, Views},
};

use super::{
    errors::{self, on_error},
    state::AppState,
};

pub struct AppParams {
    pub db: DB,
    pub identity: Arc<dyn IdentityProvider>,
}

pub async fn create_app(AppParams { db, identity }: AppParams) -> errors::Result<Router> {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    let views = Views::new(environment()?);
    let state = AppState {
        conn: db.clone(),
        views,
        identity,
    };

    let app = Router::new()
        .route("/__version__", get(version))
        .route("/__heartbeat__", get(heartbeat))
        .route("/__lbheartbeat__", get(lbheartbeat))
        .merge(pages::router(state.clone()))
        .merge(identity::router(state.clone()))
        .merge(notes::router(state.clone()))
        .merge(profiles::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(db))
                .layer(session_layer)
                .layer(middleware::from_fn(on_error)),
        );

    Ok(app)
}

async fn version() -> impl IntoResponse {
    let config = &config();
    Json(json!({
        "source" : config.source,
        "version": config.version,
        "commit" : config.git_commit,
        "build"  : config.pipeline_id
    }))
}

async fn heartbeat() -> impl IntoResponse {
    let mut rng = rand::thread_rng();
    let random: u32 = rng.gen_range(0..=10000);

    Json(json!({
        "status" : "ok",
        "random": random,
    }))
}

async fn lbheartbeat() -> impl IntoResponse {
    ""
}
