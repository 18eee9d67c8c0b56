use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

/// Credentials for the first admin account.
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub uploads_dir: PathBuf,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
    pub admin: Option<AdminSeed>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = var("SHOWROOM_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SHOWROOM_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("SHOWROOM_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("SHOWROOM_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SHOWROOM_PORT must be a port number")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

        let admin = match (
            var("SHOWROOM_ADMIN_NAME"),
            var("SHOWROOM_ADMIN_EMAIL"),
            var("SHOWROOM_ADMIN_PASSWORD"),
        ) {
            (Some(name), Some(email), Some(password)) => Some(AdminSeed {
                name,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            addr,
            db_path: var("SHOWROOM_DB_PATH")
                .unwrap_or_else(|| "showroom.db".into())
                .into(),
            jwt_secret,
            uploads_dir: var("SHOWROOM_UPLOADS_DIR")
                .unwrap_or_else(|| "./uploads".into())
                .into(),
            cors_origin: var("SHOWROOM_CORS_ORIGIN"),
            admin,
        })
    }
}
