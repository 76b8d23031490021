use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    identity::UserId,
    notes::{filter_notes, CreateNote, Note, NoteColor, NoteId, UpdateNote},
    Error,
};

use super::{
    api::NoteApi,
    editor::RichTextEditor,
    notify::Notification,
    view_mode::{ViewMode, ViewModeStore},
};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this note?";
pub const TITLE_REQUIRED: &str = "Title is required.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong.";
pub const NOTE_NOT_FOUND: &str = "Note not found";

/// State of the notes screen: the cached list, the search box, the layout toggle and the
/// editor with its draft.
///
/// The list only changes with what the server returns. Nothing is applied optimistically.
pub struct NoteListController<A, E, S> {
    api: A,
    editor: E,
    view_store: S,
    user_id: UserId,

    notes: Vec<Note>,
    search_query: String,
    view_mode: ViewMode,

    editing_note_id: Option<NoteId>,
    editor_open: bool,
    title: String,
    color: NoteColor,
    loaded_body: Option<LoadedBody>,

    loading: bool,
    notifications: VecDeque<Notification>,
}

/// Body of the note being edited as stored, and as the editor first produced it.
/// While the editor still produces `rendered`, saving writes `stored` back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedBody {
    pub stored: String,
    pub rendered: String,
}

/// Everything but the notes, for screens that outlive one controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenState<E> {
    pub search_query: String,
    pub editing_note_id: Option<NoteId>,
    pub editor_open: bool,
    pub title: String,
    pub color: NoteColor,
    pub editor: E,
    pub loaded_body: Option<LoadedBody>,
    pub notifications: Vec<Notification>,
}

impl<A, E, S> NoteListController<A, E, S>
where
    A: NoteApi,
    E: RichTextEditor,
    S: ViewModeStore,
{
    pub async fn new(api: A, editor: E, view_store: S, user_id: UserId, initial_notes: Vec<Note>) -> Self {
        let view_mode = view_store.load().await.unwrap_or_default();

        Self {
            api,
            editor,
            view_store,
            user_id,
            notes: initial_notes,
            search_query: String::new(),
            view_mode,
            editing_note_id: None,
            editor_open: false,
            title: String::new(),
            color: NoteColor::default(),
            loaded_body: None,
            loading: false,
            notifications: VecDeque::new(),
        }
    }

    pub fn restore(&mut self, state: ScreenState<E>) {
        self.search_query = state.search_query;
        self.editing_note_id = state.editing_note_id;
        self.editor_open = state.editor_open;
        self.title = state.title;
        self.color = state.color;
        self.editor = state.editor;
        self.loaded_body = state.loaded_body;
        self.notifications = state.notifications.into();
    }

    pub fn screen_state(&self) -> ScreenState<E>
    where
        E: Clone,
    {
        ScreenState {
            search_query: self.search_query.clone(),
            editing_note_id: self.editing_note_id,
            editor_open: self.editor_open,
            title: self.title.clone(),
            color: self.color,
            editor: self.editor.clone(),
            loaded_body: self.loaded_body.clone(),
            notifications: self.notifications.iter().cloned().collect(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Notes matching the search box, in list order.
    pub fn filtered_notes(&self) -> Vec<&Note> {
        filter_notes(&self.notes, &self.search_query)
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        if self.notes.is_empty() {
            Some("No notes yet. Create your first note!")
        } else if self.filtered_notes().is_empty() {
            Some("No notes match your search.")
        } else {
            None
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn editing_note_id(&self) -> Option<NoteId> {
        self.editing_note_id
    }

    pub fn is_editor_open(&self) -> bool {
        self.editor_open
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn color(&self) -> NoteColor {
        self.color
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_save(&self) -> bool {
        self.editor_open && !self.loading
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_color(&mut self, color: NoteColor) {
        self.color = color;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub async fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        if let Err(error) = self.view_store.save(mode).await {
            tracing::warn!("could not store view mode: {error}");
        }
    }

    pub async fn toggle_view_mode(&mut self) {
        self.set_view_mode(self.view_mode.toggled()).await;
    }

    /// Replaces the list with what the server has. On failure the list stays as it was.
    pub async fn refresh(&mut self) {
        self.loading = true;
        let result = self.api.list(Some(self.user_id)).await;
        self.loading = false;

        match result {
            Ok(notes) => self.notes = notes,
            Err(error) => self.report(error),
        }
    }

    /// Creates or updates the note from the draft. Returns `true` when the server accepted it.
    pub async fn save(&mut self) -> bool {
        if self.title.trim().is_empty() {
            self.notifications.push_back(Notification::warning(TITLE_REQUIRED));
            return false;
        }

        self.loading = true;
        let content = self.editor.content();
        let description = match &self.loaded_body {
            Some(loaded) if loaded.rendered == content => loaded.stored.clone(),
            _ => content,
        };

        let result = match self.editing_note_id {
            Some(note_id) => {
                let update = UpdateNote {
                    note_id: Some(note_id),
                    title: self.title.clone(),
                    description,
                    color: self.color,
                };
                self.api.update(update).await.map(|note| (note, false))
            }
            None => {
                let create = CreateNote {
                    title: self.title.clone(),
                    description,
                    color: self.color,
                    user_id: Some(self.user_id),
                };
                self.api.add(create).await.map(|note| (note, true))
            }
        };
        self.loading = false;

        match result {
            Ok((note, true)) => {
                self.notes.insert(0, note);
                self.notifications.push_back(Notification::success("Note added."));
            }
            Ok((note, false)) => {
                if let Some(existing) = self.notes.iter_mut().find(|n| n.id == note.id) {
                    *existing = note;
                }
                self.notifications.push_back(Notification::success("Note updated."));
            }
            Err(error) => {
                self.report(error);
                return false;
            }
        }

        self.reset_editor();
        true
    }

    /// Deletes after `confirm` agrees to [`DELETE_PROMPT`].
    pub async fn delete_note(&mut self, note_id: NoteId, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !confirm(DELETE_PROMPT) {
            return false;
        }

        self.loading = true;
        let result = self.api.delete(Some(note_id)).await;
        self.loading = false;

        match result {
            Ok(true) => {
                self.notes.retain(|note| note.id != note_id);
                self.notifications.push_back(Notification::success("Note deleted."));
                true
            }
            Ok(false) => {
                self.notifications.push_back(Notification::error(SOMETHING_WENT_WRONG));
                false
            }
            Err(error) => {
                self.report(error);
                false
            }
        }
    }

    pub fn start_edit(&mut self, note: &Note) {
        self.title = note.title.clone();
        self.color = note.color;
        self.editing_note_id = Some(note.id);
        self.editor.set_content(&note.description);
        self.loaded_body = Some(LoadedBody {
            stored: note.description.clone(),
            rendered: self.editor.content(),
        });
        self.editor_open = true;
    }

    /// [`Self::start_edit`] on a note of the current list.
    pub fn start_edit_by_id(&mut self, note_id: NoteId) -> bool {
        let Some(note) = self.notes.iter().find(|note| note.id == note_id).cloned() else {
            self.report(Error::Store(NOTE_NOT_FOUND.into()));
            return false;
        };

        self.start_edit(&note);
        true
    }

    pub fn create_new(&mut self) {
        self.editor_open = true;
    }

    /// Discards the draft and closes the editor.
    pub fn reset_editor(&mut self) {
        self.title.clear();
        self.color = NoteColor::default();
        self.editing_note_id = None;
        self.loaded_body = None;
        self.editor.clear();
        self.editor_open = false;
    }

    fn report(&mut self, error: Error) {
        tracing::warn!("note action failed: {error:?}");

        let notification = match error {
            Error::Validation(message) => Notification::warning(message),
            Error::Store(message) => Notification::error(message),
            _ => Notification::error(SOMETHING_WENT_WRONG),
        };
        self.notifications.push_back(notification);
    }
}
