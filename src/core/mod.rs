// Domain types, errors and secret handling

pub mod errors;
pub mod models;
pub mod secrets;
