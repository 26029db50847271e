pub mod api;
pub mod auth;
pub mod cloud;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod report;
pub mod services;
pub mod state;
pub mod stats;
pub mod store;
pub mod sync;
