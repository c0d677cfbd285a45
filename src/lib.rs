pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migrate;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use app::app;
pub use state::AppState;
