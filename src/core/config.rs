use anyhow::{Context, Result};

pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub pos: PosConfig,
}

pub struct DatabaseConfig {
    pub url: String,
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

pub struct PosConfig {
    pub tax_rate: f32,
    pub low_stock_threshold: f32,
}

pub fn load() -> Result<Config> {
    Ok(Config {
        database: DatabaseConfig {
            url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
        },
        server: ServerConfig {
            host: std::env::var("HOST").unwrap_or("0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or("3000".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
        },
        auth: AuthConfig {
            jwt_secret: jwt_secret(),
            token_ttl_seconds: token_ttl_seconds(),
        },
        pos: PosConfig {
            tax_rate: tax_rate(),
            low_stock_threshold: low_stock_threshold(),
        },
    })
}

pub fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or("tavola-pos-dev-secret".to_string())
}

/// Access tokens cover a full shift by default.
pub fn token_ttl_seconds() -> i64 {
    std::env::var("TOKEN_TTL_SECONDS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8 * 60 * 60)
}

pub fn tax_rate() -> f32 {
    std::env::var("POS_TAX_RATE")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0.12)
}

pub fn low_stock_threshold() -> f32 {
    std::env::var("POS_LOW_STOCK_THRESHOLD")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(10.0)
}
