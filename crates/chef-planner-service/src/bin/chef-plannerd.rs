use std::io;

use chef_planner_service::{PlannerService, ServiceConfig};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    let config = ServiceConfig::from_env();
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let server = PlannerService::from_config(&config);
    server.serve_stdio()
}
