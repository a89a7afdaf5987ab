//! Process configuration, read from environment variables once at startup.

use std::env;

/// Credentials for the admin account provisioned at startup.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Absent means run on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Issuer name printed on share certificates.
    pub company_name: String,
    /// Provisioned on startup when both `ADMIN_EMAIL` and `ADMIN_PASSWORD`
    /// are set.
    pub admin: Option<AdminBootstrap>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let database_url = env::var("DATABASE_URL").ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok().filter(|ttl| *ttl > 0))
            .unwrap_or(1_800);

        let company_name =
            env::var("COMPANY_NAME").unwrap_or_else(|_| "Acme Holdings, Inc.".to_string());

        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminBootstrap { email, password }),
            _ => None,
        };

        Self {
            bind_addr,
            database_url,
            jwt_secret,
            token_ttl_secs,
            company_name,
            admin,
        }
    }
}
