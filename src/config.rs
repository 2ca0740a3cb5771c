use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub store_backend: StoreBackend,
    pub api_bind: String,
    pub health_bind: String,
    pub service_id: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_ms: u64,
    pub legacy_pagination: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://127.0.0.1:5432/suxen".to_string());
        if database_url.trim().is_empty() {
            return Err("DATABASE_URL cannot be empty".to_string());
        }
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err("DATABASE_URL must use the postgres:// scheme".to_string());
        }

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            _ => return Err("STORE_BACKEND must be 'postgres' or 'memory'".to_string()),
        };

        let api_bind = env::var("API_BIND")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        if api_bind.trim().is_empty() {
            return Err("API_BIND cannot be empty".to_string());
        }

        let health_bind = env::var("HEALTH_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9091".to_string());
        if health_bind.trim().is_empty() {
            return Err("HEALTH_BIND cannot be empty".to_string());
        }
        if health_bind == api_bind {
            return Err("HEALTH_BIND must differ from API_BIND".to_string());
        }

        let service_id = env::var("SERVICE_ID")
            .unwrap_or_else(|_| format!("mod-catalog-{}", uuid::Uuid::new_v4()));
        if service_id.trim().is_empty() {
            return Err("SERVICE_ID cannot be empty".to_string());
        }

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a number".to_string())?;
        if !(1..=100).contains(&db_max_connections) {
            return Err("DB_MAX_CONNECTIONS must be between 1 and 100".to_string());
        }

        let db_connect_timeout_ms = env::var("DB_CONNECT_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse::<u64>()
            .map_err(|_| "DB_CONNECT_TIMEOUT_MS must be a number".to_string())?;
        if !(100..=120_000).contains(&db_connect_timeout_ms) {
            return Err("DB_CONNECT_TIMEOUT_MS must be between 100 and 120000".to_string());
        }

        let legacy_pagination = match env::var("LEGACY_PAGINATION") {
            Ok(v) => parse_flag(&v).ok_or_else(|| "LEGACY_PAGINATION must be true or false".to_string())?,
            Err(_) => false,
        };

        Ok(Config {
            database_url,
            store_backend,
            api_bind,
            health_bind,
            service_id,
            db_max_connections,
            db_connect_timeout_ms,
            legacy_pagination,
        })
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
