pub mod app;
pub mod config;
pub mod ctx;
pub mod errors;
pub mod state;

pub use app::{create_app, AppParams};
