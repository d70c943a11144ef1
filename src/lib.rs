pub mod activity;
pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod site;
pub mod state;
pub mod stats;
pub mod students;
pub mod ui;

pub use api::ApiClient;
pub use app::router;
pub use config::Config;
pub use state::AppState;
