//! HTTP surface and administrative commands for the albumshelf catalog.

pub mod api;
pub mod app;
pub mod auth;
pub mod commands;
pub mod error;
pub mod extract;

pub use app::{router, ServerConfig};
