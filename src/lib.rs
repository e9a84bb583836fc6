pub mod config;
pub mod errors;
pub mod format;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod sanitize;
pub mod speech;
pub mod turn;
