//! The interactive notes screen: list state, draft editing and the layout preference.
//! It talks to the note actions only through [`api::NoteApi`].

pub mod api;
pub mod controller;
pub mod editor;
pub mod notify;
pub mod view_mode;

pub use api::{NoteApi, ServerActions};
pub use controller::{NoteListController, ScreenState};
pub use editor::{EditorCommand, HtmlEditor, PlainTextEditor, RichTextEditor};
pub use notify::{Level, Notification};
pub use view_mode::{FileViewModeStore, MemoryViewModeStore, SessionViewModeStore, ViewMode, ViewModeStore};
