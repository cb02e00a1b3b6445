use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::{CatalogConfig, DEFAULT_BASE_URL};
use crate::error::AppError;

const DEFAULT_DB_DIR: &str = "db";
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub term: u32,
    pub db_dir: PathBuf,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_key = lookup("UW_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config("UW_API_KEY is not set".to_string()))?;
        let term = lookup("UW_TERM")
            .ok_or_else(|| AppError::Config("UW_TERM is not set".to_string()))
            .and_then(|v| parse_var("UW_TERM", &v))?;

        let base_url = lookup("UW_API_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let db_dir = PathBuf::from(lookup("DB_DIR").unwrap_or_else(|| DEFAULT_DB_DIR.to_string()));

        let cache_ttl = match lookup("CACHE_TTL_SECS") {
            Some(v) => parse_var("CACHE_TTL_SECS", &v)?,
            None => DEFAULT_CACHE_TTL_SECS,
        };
        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(v) => parse_var("FETCH_TIMEOUT_SECS", &v)?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };
        let bind_addr = parse_var(
            "BIND_ADDR",
            &lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        Ok(Self {
            api_key,
            base_url,
            term,
            db_dir,
            cache_ttl: Duration::from_secs(cache_ttl),
            fetch_timeout: Duration::from_secs(fetch_timeout),
            bind_addr,
        })
    }

    pub fn catalog(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.fetch_timeout,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, value)))
}
