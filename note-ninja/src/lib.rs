mod app;
pub mod client;
pub mod db;
pub mod identity;
pub mod notes;
mod pages;
pub mod profiles;
pub mod shared;

pub use app::{
    config, create_app, ctx,
    errors::{self, Error, Result},
    state, AppParams,
};
pub use shared::views;
