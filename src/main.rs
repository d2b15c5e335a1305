use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kistpay::config::Config;
use kistpay::middleware::{AgentIdentity, RequestIdMiddleware};
use kistpay::modules::collections::controllers::collection_controller;
use kistpay::modules::collections::repositories::CollectionRepository;
use kistpay::modules::collections::services::CollectionService;
use kistpay::modules::customers::repositories::CustomerRepository;
use kistpay::modules::reports::controllers::report_controller;
use kistpay::modules::reports::repositories::MySqlReportRepository;
use kistpay::modules::reports::services::ReportService;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kistpay=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::info!("Starting KistPay Field Collection Platform");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Apply pending schema migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");

    // Wire repositories and services
    let collection_service = Arc::new(CollectionService::new(
        CollectionRepository::new(db_pool.clone()),
        CustomerRepository::new(db_pool.clone()),
    ));
    let report_service = Arc::new(ReportService::new(
        Arc::new(MySqlReportRepository::new(db_pool.clone())),
        CustomerRepository::new(db_pool.clone()),
    ));

    let signing_secret = config.security.identity_signing_secret.clone().into_bytes();
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let app_config = config.clone();

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(app_config.clone()))
            .app_data(web::Data::new(collection_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .wrap(AgentIdentity::new(signing_secret.clone()))
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .wrap(cors)
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(index))
            .service(
                web::scope("/api")
                    .configure(collection_controller::configure)
                    .configure(report_controller::configure),
            )
    });

    let server = match workers {
        Some(workers) => server.workers(workers),
        None => server,
    };

    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("HTTP server terminated abnormally")
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "kistpay"
    }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "KistPay Field Collection Platform",
        "version": "0.1.0",
        "status": "running"
    }))
}
