//! Todo RPC server.
//!
//! # Overview
//! Exposes five procedures over HTTP (`todo.list`, `todo.byId`, `todo.add`,
//! `todo.delete`, `todo.toggle`) backed by a pluggable [`store::TodoStore`].
//!
//! # Design
//! - Inputs are parsed into validated structs in [`input`] before the
//!   [`service::TodoService`] sees them.
//! - The service holds an injected store handle and clock; it issues one
//!   store call per operation and keeps no state of its own.
//! - [`rpc`] owns the wire format: procedure routing, the result envelope,
//!   and the mapping from service errors to machine-readable codes.

pub mod config;
pub mod error;
pub mod input;
pub mod rpc;
pub mod service;
pub mod store;
pub mod todo;

use std::{future::Future, sync::Arc};

use axum::{routing::get, Router};
use mockable::DefaultClock;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::ServiceError;
pub use service::TodoService;
pub use store::{MemoryStore, SqliteStore, StoreError, TodoStore};
pub use todo::{Todo, TodoPage};

/// Build the router for a service.
pub fn app(service: TodoService) -> Router {
    Router::new()
        .route("/trpc/{procedure}", get(rpc::query).post(rpc::mutation))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Router over a fresh in-memory store and the system clock.
pub fn in_memory_app() -> Router {
    app(in_memory_service())
}

pub fn in_memory_service() -> TodoService {
    TodoService::new(Arc::new(MemoryStore::new()), Arc::new(DefaultClock))
}

/// Serve an in-memory store until the listener fails.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, in_memory_app()).await
}

/// Serve `service` until `shutdown` resolves, then close its store.
pub async fn serve<F>(
    listener: TcpListener,
    service: TodoService,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = Arc::clone(service.store());
    let result = axum::serve(listener, app(service))
        .with_graceful_shutdown(shutdown)
        .await;
    store.close().await;
    result
}

async fn health() -> &'static str {
    "ok"
}
