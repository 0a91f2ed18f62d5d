//! External model provider.
//!
//! Only the healthcheck path talks to the provider from here; chat traffic
//! is issued by the TypeScript service with the same resolved model ids.

mod client;
mod http;

pub use client::{PingResult, ProviderClient, DEFAULT_BASE_URL};
pub use http::RetryPolicy;

/// API key for the provider
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Override for the provider base URL
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
