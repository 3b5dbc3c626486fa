//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

use crate::application::services::{
    ChatServiceImpl, MemberServiceImpl, MessageServiceImpl, UserServiceImpl,
};
use crate::config::Settings;
use crate::domain::SessionFactory;
use crate::infrastructure::database::{self, PgSessionFactory};
use crate::infrastructure::memory::MemoryStore;
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging, metrics};
use crate::presentation::websocket::Gateway;
use crate::shared::{AppError, SecretHasher};

/// Application state shared across handlers
pub struct AppState<S: SessionFactory> {
    pub store: Arc<S>,
    pub users: Arc<UserServiceImpl<S>>,
    pub chats: Arc<ChatServiceImpl<S>>,
    pub members: Arc<MemberServiceImpl<S>>,
    pub messages: Arc<MessageServiceImpl<S>>,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

// A derive would require `S: Clone`
impl<S: SessionFactory> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            users: Arc::clone(&self.users),
            chats: Arc::clone(&self.chats),
            members: Arc::clone(&self.members),
            messages: Arc::clone(&self.messages),
            gateway: Arc::clone(&self.gateway),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<S: SessionFactory> AppState<S> {
    /// Wire every service onto one store
    pub fn new(store: Arc<S>, settings: Settings) -> Result<Self, AppError> {
        let hasher = SecretHasher::new(&settings.security)?;

        Ok(Self {
            users: Arc::new(UserServiceImpl::new(Arc::clone(&store), hasher)),
            chats: Arc::new(ChatServiceImpl::new(Arc::clone(&store))),
            members: Arc::new(MemberServiceImpl::new(Arc::clone(&store))),
            messages: Arc::new(MessageServiceImpl::new(Arc::clone(&store), settings.paging.max_take)),
            gateway: Arc::new(Gateway::new(&settings.gateway)),
            settings: Arc::new(settings),
            store,
        })
    }
}

/// Full router with middleware applied
pub fn build_router<S: SessionFactory>(state: AppState<S>) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);

    routes::create_router(state).layer(
        ServiceBuilder::new()
            .layer(logging::create_trace_layer())
            .layer(axum::middleware::from_fn(metrics::track_http_metrics))
            .layer(cors),
    )
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let router = if settings.database.is_memory() {
            tracing::warn!("Using the in-process store, data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            build_router(AppState::new(store, settings.clone())?)
        } else {
            let pool = database::create_pool(&settings.database).await?;
            tracing::info!("Database connection pool created");

            if settings.database.run_migrations {
                database::run_migrations(&pool).await?;
                tracing::info!("Database migrations applied");
            }

            let store = Arc::new(PgSessionFactory::new(pool));
            build_router(AppState::new(store, settings.clone())?)
        };

        let listener = TcpListener::bind(settings.server_addr()).await?;
        tracing::info!("Listening on {}", settings.server_addr());

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
