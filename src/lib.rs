pub mod app;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod render;
pub mod storage;
pub mod theme;
pub mod tmdb;
pub mod watchlist;
