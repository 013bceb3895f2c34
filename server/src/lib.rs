// Library exports for testing and reuse

pub mod access_token;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
