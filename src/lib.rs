pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod models;
pub mod services;
