//! Plaza server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware, Router};
use plaza_api::{middleware::AppState, router as api_router};
use plaza_common::{Config, LocalStorage};
use plaza_core::{
    CommentService, FriendshipService, GroupService, MediaService, PostService, ProfileService,
    UserService,
};
use plaza_db::repositories::{
    CommentRepository, FriendRequestRepository, FriendshipRepository, GroupPostRepository,
    GroupRepository, PostLikeRepository, PostRepository, UserProfileRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Request bodies above this are rejected before any handler runs.
/// Large enough for an 8 MiB post image plus multipart overhead.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plaza=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting plaza server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(plaza_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    plaza_db::migrate(db.as_ref()).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let request_repo = FriendRequestRepository::new(Arc::clone(&db));
    let friendship_repo = FriendshipRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let like_repo = PostLikeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let group_post_repo = GroupPostRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(Arc::clone(&db), user_repo.clone(), profile_repo.clone());
    let profile_service = ProfileService::new(user_repo.clone(), profile_repo);
    let friendship_service = FriendshipService::new(
        Arc::clone(&db),
        request_repo,
        friendship_repo,
        user_repo.clone(),
    );
    let post_service = PostService::new(post_repo.clone(), like_repo);
    let comment_service = CommentService::new(comment_repo, post_repo);
    let group_service = GroupService::new(Arc::clone(&db), group_repo, group_post_repo, user_repo);

    let storage = Arc::new(LocalStorage::new(
        PathBuf::from(&config.storage.path),
        config.storage.base_url.clone(),
    ));
    let media_service = MediaService::new(storage);

    let state = AppState {
        user_service,
        profile_service,
        friendship_service,
        post_service,
        comment_service,
        group_service,
        media_service,
    };

    let app = Router::new()
        .merge(api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            plaza_api::middleware::auth_middleware,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
