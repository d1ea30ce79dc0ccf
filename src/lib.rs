// Library root for the Lifusic account service

pub mod core;
pub mod state;
pub mod auth;
pub mod service;
pub mod api;
pub mod config;
