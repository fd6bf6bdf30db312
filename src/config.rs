use anyhow::{Context, Result};
use std::{env, net::SocketAddr, path::PathBuf};

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_BIND: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub image_base_url: String,
    pub language: String,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("TMDB_API_KEY not set")?;
        let bind = var_or("CINESTREAM_BIND", DEFAULT_BIND);
        let bind_addr = bind
            .parse()
            .with_context(|| format!("CINESTREAM_BIND is not a socket address: {}", bind))?;

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url: trim_slash(var_or("TMDB_BASE_URL", DEFAULT_TMDB_BASE)),
            image_base_url: trim_slash(var_or("TMDB_IMAGE_BASE_URL", DEFAULT_IMAGE_BASE)),
            language: var_or("TMDB_LANGUAGE", DEFAULT_LANGUAGE),
            data_dir: PathBuf::from(var_or("CINESTREAM_DATA_DIR", DEFAULT_DATA_DIR)),
            bind_addr,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
