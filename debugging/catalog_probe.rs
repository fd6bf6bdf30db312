//! Query the catalog client directly and print the results as JSON.
//! Usage:
//!   cargo run --bin catalog_probe -- home [page]
//!   cargo run --bin catalog_probe -- movie <tmdb_id>
//!   cargo run --bin catalog_probe -- search <query...>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinestream::config::Config;
use cinestream::tmdb::{resolve_trailer_key, TmdbApi, TmdbClient};
use dotenvy::dotenv;
use serde_json::{json, Value};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Home,
    Movie,
    Search,
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "home" => Ok(Command::Home),
            "movie" => Ok(Command::Movie),
            "search" => Ok(Command::Search),
            _ => Err(anyhow::anyhow!("command must be 'home', 'movie' or 'search'")),
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin catalog_probe -- home [page]");
    eprintln!("       cargo run --bin catalog_probe -- movie <tmdb_id>");
    eprintln!("       cargo run --bin catalog_probe -- search <query...>");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let command = Command::from_str(&args[1])?;
    let config = Config::from_env()?;
    let client = TmdbClient::from_config(&config)?;

    let output: Value = match command {
        Command::Home => {
            let page: u32 = match args.get(2) {
                Some(p) => p.parse().context("page must be a positive integer")?,
                None => 1,
            };
            let categories = client.get_homepage_movies(page).await;
            serde_json::to_value(categories)?
        }
        Command::Movie => {
            let id: i32 = args
                .get(2)
                .unwrap_or_else(|| usage())
                .parse()
                .context("tmdb_id must be an integer")?;
            let detail = client.get_movie_details(id).await?;
            let trailer = resolve_trailer_key(&detail.videos).map(str::to_string);
            json!({
                "detail": detail,
                "trailer_key": trailer,
            })
        }
        Command::Search => {
            let query = args[2..].join(" ");
            if query.trim().is_empty() {
                usage();
            }
            let page = client.search(&query, 1).await?;
            serde_json::to_value(page)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
