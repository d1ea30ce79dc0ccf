// Redis-backed token state

pub mod redis_store;
