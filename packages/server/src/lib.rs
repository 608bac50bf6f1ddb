#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the hazard fence application.
//!
//! Serves the REST API the map frontend talks to: the fence registry
//! (create from drawn GeoJSON shapes, list with render colors, delete),
//! trail session persistence, and the alert event log. Fence entry
//! alerts posted by tracking clients are forwarded to the configured
//! notifier.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use hazard_fence_database::{db, run_migrations};
use hazard_fence_notify::{AlertNotifier, notifier_from_env};
use std::sync::Arc;
use switchy_database::Database;

/// Shared application state.
pub struct AppState {
    /// Database connection.
    pub db: Arc<dyn Database>,
    /// Alert delivery channel for fence entry events.
    pub notifier: Arc<dyn AlertNotifier>,
}

/// Starts the hazard fence API server.
///
/// Connects to the registry database, runs migrations, builds the alert
/// notifier from the environment, and starts the Actix-Web HTTP server.
/// This is a regular async function — the caller is responsible for
/// providing the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if the database connection or migrations fail.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env()
        .await
        .expect("Failed to connect to database");

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref())
        .await
        .expect("Failed to run migrations");

    let state = web::Data::new(AppState {
        db: Arc::from(db_conn),
        notifier: Arc::from(notifier_from_env()),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/fences", web::get().to(handlers::list_fences))
                    .route("/fences", web::post().to(handlers::create_fence))
                    .route("/fences/{id}", web::delete().to(handlers::delete_fence))
                    .route("/tracking", web::post().to(handlers::save_trail))
                    .route("/alert-events", web::get().to(handlers::list_alert_events))
                    .route("/alert-events", web::post().to(handlers::log_alert_event)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
