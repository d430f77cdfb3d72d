//! Core library for discovered-on
pub mod config;
pub mod error;
pub mod models;
pub mod api;
pub mod browser;
pub mod discover;
pub mod resolver;
pub mod aggregate;
pub mod normalize;
pub mod export;
pub mod util;
