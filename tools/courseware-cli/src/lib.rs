pub mod commands;
pub mod config;
pub mod ecommerce;
pub mod snapshot;
