use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub host: String,
    pub allowed_origins: Vec<String>,
    pub database_max_connections: u32,
    pub session_ttl_secs: usize,
    // Votes per user per hour
    pub vote_rate_limit: u32,
    // Comments per user per minute
    pub comment_rate_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            jwt_secret: env::var("JWT_SECRET")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(20),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(86400), // matches the 24h token lifetime
            vote_rate_limit: env::var("VOTE_RATE_LIMIT")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(100),
            comment_rate_limit: env::var("COMMENT_RATE_LIMIT")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),
        })
    }
}
