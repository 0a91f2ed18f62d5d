mod healthcheck;
mod models;
mod seed;
mod serve;

pub use healthcheck::run_healthcheck;
pub use models::run_models;
pub use seed::run_seed;
pub use serve::run_serve;
