// Account use cases

pub mod authentication;
