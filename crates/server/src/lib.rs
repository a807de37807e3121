pub mod auth;
pub mod errors;
pub mod rate_limiter;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{build_app, run};
