use actix_web::web;

pub mod dashboard;
pub mod health;

pub use dashboard::dashboard_config;
pub use health::health_config;

/// Every route served under the `/api/v1` scope.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health_config).configure(dashboard_config);
}
