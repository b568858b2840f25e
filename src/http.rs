pub mod handler;

use crate::endpoint::{Authors, Books, EntityEndpoint, Resource};
use crate::error::ApiError;
use crate::logger::Logger;
use crate::models::{Author, Book};
use crate::repositories::Repository;
use anyhow::{Context, anyhow};
use axum::Router;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    authors: EntityEndpoint<Authors>,
    books: EntityEndpoint<Books>,
    logger: Arc<dyn Logger>,
}

impl AppState {
    pub fn new(
        authors: Arc<dyn Repository<Author>>,
        books: Arc<dyn Repository<Book>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            authors: EntityEndpoint::new(authors, Arc::clone(&logger)),
            books: EntityEndpoint::new(books, Arc::clone(&logger)),
            logger,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpServerConfig {
    port: u16,
    cors_origins: Vec<String>,
}

impl HttpServerConfig {
    pub const fn new(port: u16, cors_origins: Vec<String>) -> Self {
        Self { port, cors_origins }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(state: AppState, config: HttpServerConfig) -> anyhow::Result<Self> {
        let router = router(state, &config);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("catalog api listening on {}", self.local_addr()?);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Received error from running server")?;
        tracing::info!("catalog api stopped");
        Ok(())
    }
}

/// Every catalog route with the tracing, CORS and panic layers applied.
pub fn router(state: AppState, config: &HttpServerConfig) -> Router {
    Router::new()
        .merge(resource_routes(state.authors))
        .merge(resource_routes(state.books))
        .layer(CatchPanicLayer::custom(panic_response(state.logger)))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn resource_routes<R: Resource>(endpoint: EntityEndpoint<R>) -> Router {
    read_routes::<R>()
        .merge(write_routes::<R>())
        .with_state(endpoint)
}

fn read_routes<R: Resource>() -> Router<EntityEndpoint<R>> {
    Router::new()
        .route(&collection_path::<R>(), get(handler::list::<R>))
        .route(&member_path::<R>(), get(handler::get::<R>))
}

/// Mutating routes; an authorization layer belongs on this group only.
fn write_routes<R: Resource>() -> Router<EntityEndpoint<R>> {
    Router::new()
        .route(
            &collection_path::<R>(),
            axum::routing::post(handler::create::<R>),
        )
        .route(
            &member_path::<R>(),
            axum::routing::put(handler::update::<R>).delete(handler::delete::<R>),
        )
}

fn collection_path<R: Resource>() -> String {
    format!("/{}", R::NAME)
}

fn member_path<R: Resource>() -> String {
    format!("/{}/{{id}}", R::NAME)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(cors::Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any)
}

/// A panicking handler is an unhandled failure: full detail to the log, generic 500 to the client.
fn panic_response(
    logger: Arc<dyn Logger>,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |panic| {
        let detail = panic
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| panic.downcast_ref::<&str>().copied())
            .unwrap_or("panic with a non-string payload");
        let err = ApiError::Unhandled(anyhow!("handler panicked: {detail}"));
        logger.error(&format!("http: {err}"));
        err.into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
