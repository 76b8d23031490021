use async_trait::async_trait;

use crate::{
    ctx::BaseParams,
    identity::UserId,
    notes::{actions, CreateNote, Note, NoteId, UpdateNote},
    Result,
};

/// The four note actions as the controller sees them.
#[async_trait]
pub trait NoteApi: Send + Sync {
    async fn add(&self, note: CreateNote) -> Result<Note>;

    async fn update(&self, note: UpdateNote) -> Result<Note>;

    async fn list(&self, user_id: Option<UserId>) -> Result<Vec<Note>>;

    async fn delete(&self, note_id: Option<NoteId>) -> Result<bool>;
}

/// Calls the actions in-process with a fixed request context.
#[derive(Clone, Debug)]
pub struct ServerActions {
    base: BaseParams,
}

impl ServerActions {
    pub fn new(base: BaseParams) -> Self {
        Self { base }
    }
}

#[async_trait]
impl NoteApi for ServerActions {
    async fn add(&self, note: CreateNote) -> Result<Note> {
        actions::add_note(note, self.base.clone()).await
    }

    async fn update(&self, note: UpdateNote) -> Result<Note> {
        actions::update_note(note, self.base.clone()).await
    }

    async fn list(&self, user_id: Option<UserId>) -> Result<Vec<Note>> {
        actions::list_notes(user_id, self.base.clone()).await
    }

    async fn delete(&self, note_id: Option<NoteId>) -> Result<bool> {
        actions::delete_note(note_id, self.base.clone()).await
    }
}
