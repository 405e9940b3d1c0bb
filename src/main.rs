use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{get, http::header, web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use budget_query::analytics::{Clock, SystemClock};
use budget_query::config::AppConfig;
use budget_query::{auth, configure_api, openapi, validate_registries, QUERYABLE_TABLES};

/// Health check endpoint that verifies database connectivity
#[get("/health")]
async fn health_check(pool: web::Data<PgPool>) -> impl Responder {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

fn invalid_data(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {e}");
        invalid_data(e.to_string())
    })?;

    validate_registries().map_err(|(table, e)| {
        error!(table, "Invalid column registry: {e}");
        invalid_data(format!("{table}: {e}"))
    })?;
    for table in QUERYABLE_TABLES {
        info!(table = table.name, columns = table.columns.len(), "Column registry loaded");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to create pool: {e}");
            std::io::Error::other(e)
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {e}");
            std::io::Error::other(e)
        })?;

    // About 5 requests per minute with a burst of 5
    let auth_governor_config = GovernorConfigBuilder::default()
        .seconds_per_request(12)
        .burst_size(5)
        .finish()
        .ok_or_else(|| invalid_data("Invalid rate limiter config".to_string()))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let clock = web::Data::from(clock);
    let query_settings = config.query;
    let jwt_secret = config.jwt_secret.clone();
    let allowed_origins = config.cors_allowed_origins.clone();

    info!(
        "Starting server at http://{}:{}",
        config.bind_address, config.port
    );

    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();

        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .split(',')
                    .any(|allowed| allowed.trim() == origin_str)
            })
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            // Middleware (order matters: outer to inner)
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_secret.clone()))
            .app_data(web::Data::new(query_settings))
            .app_data(clock.clone())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
            )
            .service(health_check)
            .configure(configure_api)
            // Rate limited auth endpoints (must be last to avoid catching all routes)
            .service(
                web::scope("")
                    .wrap(Governor::new(&auth_governor_config))
                    .service(auth::register)
                    .service(auth::login),
            )
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
