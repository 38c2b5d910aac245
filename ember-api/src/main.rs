use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use ember_shared::clients::db::{create_pool, DbPool};
use ember_shared::clients::generation::GenerationClient;
use ember_shared::clients::minio::MinioClient;
use ember_shared::clients::rabbitmq::RabbitMQClient;
use ember_shared::clients::redis::RedisClient;

const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub minio: MinioClient,
    pub generation: GenerationClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ember_shared::middleware::init_tracing("ember-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url);

    // Infrastructure clients
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;
    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;
    let generation = GenerationClient::new(&config.generation_api_url, &config.generation_api_key);

    let metrics_handle = ember_shared::middleware::init_metrics();

    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        minio,
        generation,
    });

    let app = Router::new()
        // Health + metrics
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        // Profile
        .route("/me", get(routes::profile::get_me))
        .route("/me/personal", post(routes::profile::create_personal))
        .route("/me/profile", patch(routes::profile::update_profile))
        .route(
            "/me/photos",
            post(routes::photos::upload_photo)
                .delete(routes::photos::delete_photo)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
        )
        .route(
            "/me/preferences",
            get(routes::preferences::get_preferences).put(routes::preferences::put_preferences),
        )
        // Feed
        .route("/feed", get(routes::feed::get_feed))
        // Likes
        .route("/likes", post(routes::likes::send_like))
        .route("/likes/discard", post(routes::likes::discard_like))
        .route("/likes/received", get(routes::likes::received_likes))
        // Matches + messages
        .route("/matches", get(routes::matches::list_matches))
        .route("/matches/:id", delete(routes::matches::unmatch))
        .route(
            "/matches/:id/messages",
            get(routes::messages::list_messages).post(routes::messages::send_message),
        )
        .route("/matches/:id/read", post(routes::messages::mark_read))
        .route(
            "/matches/:id/suggestions",
            get(routes::suggestions::get_suggestions),
        )
        .route("/messages/:id", delete(routes::messages::delete_message))
        .route("/unread-count", get(routes::messages::unread_count))
        .layer(axum::middleware::from_fn(
            ember_shared::middleware::metrics_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "ember-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
