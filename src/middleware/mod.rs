//! HTTP middleware

pub mod auth;
pub mod metrics;
pub mod model;
