pub mod env_config;
pub mod error;
pub mod graphql;
pub mod http;
pub mod identity;
pub mod jwt;
pub mod mail;
pub mod misc;
pub mod session;
