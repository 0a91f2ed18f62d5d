//! Launcher and model-config resolver for the AI tutor service.
//!
//! - [`config`]: chat and healthcheck model resolution from explicit inputs
//! - [`startup`]: loader-hook installation and entry-point bootstrap
//! - [`seed`]: content seeding collaborator
//! - [`provider`]: OpenAI-compatible client used for healthchecks

pub mod cli;
pub mod command;
pub mod config;
pub mod provider;
pub mod runtime;
pub mod seed;
pub mod startup;
