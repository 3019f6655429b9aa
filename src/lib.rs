pub mod auth;
pub mod configuration;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;

#[cfg(test)]
mod test_env;
