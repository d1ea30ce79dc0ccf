// Authentication & authorization module

pub mod jwt;
pub mod password;
pub mod user_store;
pub mod auth_middleware;
pub mod audit_logger;
