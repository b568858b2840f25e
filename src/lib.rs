pub mod config;
pub mod database;
pub mod dto;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod logger;
pub mod mapping;
pub mod models;
pub mod repositories;
pub mod telemetry;
pub mod validation;

#[cfg(test)]
mod testing;
