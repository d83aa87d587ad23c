mod database;
mod state_builder;

pub use database::{connect_and_migrate, run_migrations};
pub use state_builder::build_app_state;
