use std::net::SocketAddr;

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes::{self, auth};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn load_config() -> configs::AppConfig {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config invalid or missing, falling back to defaults");
            configs::AppConfig::default()
        }
    }
}

async fn connect_db(cfg: &configs::AppConfig) -> anyhow::Result<DatabaseConnection> {
    if cfg.database.url.trim().is_empty() {
        models::db::connect().await
    } else {
        models::db::connect_with_config(&cfg.database).await
    }
}

/// Seed a first administrator so a fresh install can log in at all.
async fn ensure_admin(db: &DatabaseConnection) -> anyhow::Result<()> {
    if !service::user_service::list_users(db).await?.is_empty() {
        return Ok(());
    }
    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "123456".to_string());
    let hash = service::auth::service::hash_password(&password)
        .map_err(|e| anyhow::anyhow!("cannot hash admin password: {}", e))?;
    let created = models::user::create(db, &username, &hash, models::user::Role::Admin).await?;
    info!(username = %created.username, "seeded initial admin user");
    Ok(())
}

pub fn routing_settings(cfg: &configs::RoutingConfig) -> anyhow::Result<auth::RoutingSettings> {
    let timezone: chrono_tz::Tz = cfg
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown routing.timezone: {}", cfg.timezone))?;
    Ok(auth::RoutingSettings {
        timezone,
        origin: cfg.origin.clone(),
        waypoint_limit: cfg.waypoint_limit,
        waypoint_limit_mobile: cfg.waypoint_limit_mobile,
    })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config();
    let db = connect_db(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    ensure_admin(&db).await?;

    let jwt_secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());
    let state = auth::ServerState {
        db,
        auth: auth::ServerAuthConfig { jwt_secret },
        routing: routing_settings(&cfg.routing)?,
    };

    let cors = build_cors();
    let app: Router = routes::build_router(cors, state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
