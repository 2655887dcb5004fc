pub mod api_client;
pub mod config;
pub mod cycle;
pub mod db;
pub mod format;
pub mod geo;
pub mod record;
