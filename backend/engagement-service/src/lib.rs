pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod repository;
pub mod services;
pub mod workers;
