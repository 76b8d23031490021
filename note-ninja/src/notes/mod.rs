pub mod actions;
pub mod card;
mod model;
mod page;
mod routes;
mod search;

pub use card::NoteCard;
pub use model::*;
pub use routes::router;
pub use search::filter_notes;
