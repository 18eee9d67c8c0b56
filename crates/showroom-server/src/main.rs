mod config;

use axum::http::{HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use showroom_api::AppStateInner;
use showroom_api::auth::hash_password;
use showroom_db::Database;
use showroom_types::models::User;

use crate::config::{AdminSeed, Config};

/// Used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "showroom=debug,showroom_api=debug,showroom_db=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e:#}");
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    let db = Database::open(&config.db_path)?;
    if let Some(admin) = &config.admin {
        seed_admin(&db, admin)?;
    }

    let cors = match config.cors_origin.as_deref() {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_str(origin)?))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        None => CorsLayer::permissive(),
    };

    let state = AppStateInner::new(db, config.jwt_secret, config.uploads_dir);
    let app = showroom_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    info!("Showroom server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Create the first admin account on an empty users collection.
fn seed_admin(db: &Database, admin: &AdminSeed) -> anyhow::Result<()> {
    if db.count::<User>()? > 0 {
        return Ok(());
    }

    let password = hash_password(admin.password.trim())
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
    db.insert(&User {
        name: admin.name.clone(),
        mail: admin.email.trim().to_string(),
        password,
    })?;

    info!("Created admin account {}", admin.email);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn default_log_filter_covers_every_crate() {
        let filter: EnvFilter = DEFAULT_LOG_FILTER.parse().unwrap();
        let rendered = filter.to_string().to_lowercase();
        for target in ["showroom_api", "showroom_db", "tower_http"] {
            assert!(rendered.contains(&format!("{target}=debug")), "{rendered}");
        }
    }
}
