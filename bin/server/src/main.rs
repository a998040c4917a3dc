use agri_kb_catalog::{CropStore, MemoryCropStore};
use agri_kb_platform_access::{
    IdentityProvider, MemorySessionStore, MemoryUserStore, SessionStore, UserStore,
};
use agri_kb_server::{
    app::build_router,
    auth::{
        AppState, GoogleClient,
        db::{PgSessionStore, PgUserStore},
        purge_expired_sessions,
    },
    config::ServerConfig,
    db::PgCropStore,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(app_env = ?config.app_env, "Loaded configuration");

    let (users, sessions, crops): (
        Arc<dyn UserStore>,
        Arc<dyn SessionStore>,
        Arc<dyn CropStore>,
    ) = match &config.database_url {
        Some(database_url) => {
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .expect("failed to connect to database");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&db_pool)
                .await
                .expect("failed to run migrations");

            (
                Arc::new(PgUserStore::new(db_pool.clone())),
                Arc::new(PgSessionStore::new(db_pool.clone())),
                Arc::new(PgCropStore::new(db_pool)),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; data will not survive a restart");
            (
                Arc::new(MemoryUserStore::new()),
                Arc::new(MemorySessionStore::new()),
                Arc::new(MemoryCropStore::new()),
            )
        }
    };

    // Cleanup expired sessions on startup, then periodically
    purge_expired_sessions(sessions.as_ref()).await;
    let cleanup_sessions = Arc::clone(&sessions);
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        // The first tick fires immediately and startup already purged.
        interval.tick().await;
        loop {
            interval.tick().await;
            purge_expired_sessions(cleanup_sessions.as_ref()).await;
        }
    });

    tracing::info!("Discovering Google OIDC provider...");
    let provider: Arc<dyn IdentityProvider> = Arc::new(
        GoogleClient::discover(config.google.clone())
            .await
            .expect("failed to discover Google provider"),
    );

    let listen_addr = config.listen_addr.clone();
    let app_state = Arc::new(AppState::new(users, sessions, crops, provider, config));
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
