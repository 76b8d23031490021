//! The notes page. Each request rebuilds a [`NoteListController`] from the session, runs
//! one operation on it, stores it back and redirects to `/notes`, which renders it.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    client::{
        controller::DELETE_PROMPT, EditorCommand, HtmlEditor, NoteListController, Notification, RichTextEditor,
        ScreenState, ServerActions, SessionViewModeStore, ViewMode,
    },
    ctx::{BaseParams, SessionUser, SESSION_USER_KEY},
    identity::IdentityUser,
    state::AppState,
    views::Views,
    Result,
};

use super::{NoteCard, NoteColor, NoteId, Theme};

const SCREEN_KEY: &str = "notes.screen";

type Screen = NoteListController<ServerActions, HtmlEditor, SessionViewModeStore>;

#[derive(Debug, Default, Deserialize)]
pub(super) struct NotesQuery {
    q: Option<String>,
    view: Option<String>,
    #[serde(default)]
    theme: Theme,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenEditorForm {
    note_id: Option<NoteId>,
    #[serde(default)]
    theme: Theme,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Intent {
    Save,
    Cancel,
}

/// The editor dialog. `body` is the edited markup, `block` the block holding the caret.
#[derive(Debug, Deserialize)]
pub(super) struct EditorForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    color: NoteColor,
    body: Option<String>,
    #[serde(default)]
    block: usize,
    command: Option<String>,
    #[serde(default)]
    href: String,
    intent: Option<Intent>,
    #[serde(default)]
    theme: Theme,
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteForm {
    note_id: NoteId,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    theme: Theme,
}

/// The session only proves a past sign-in, so the account is checked with the provider first.
pub(super) async fn notes_view(
    view: Views,
    State(state): State<AppState>,
    session: Session,
    base: BaseParams,
    Query(query): Query<NotesQuery>,
) -> Result<Response> {
    let Some(session_user) = session.get::<SessionUser>(SESSION_USER_KEY).await? else {
        return Ok(Redirect::to("/sign-in").into_response());
    };

    let Some(user) = state.identity.get_user(&session_user.access_token).await? else {
        tracing::info!(user_id = %session_user.id, "stale session");
        session.flush().await?;
        return Ok(Redirect::to("/sign-in").into_response());
    };

    let Some(mut screen) = load(&session, base).await? else {
        return Ok(Redirect::to("/sign-in").into_response());
    };

    if let Some(q) = query.q {
        screen.set_search_query(q);
    }
    if let Some(mode) = query.view.as_deref().and_then(ViewMode::parse) {
        screen.set_view_mode(mode).await;
    }

    let notifications = screen.take_notifications();
    store(&session, &screen).await?;

    Ok(render(&view, &screen, user, notifications, query.theme))
}

pub(super) async fn open_editor(session: Session, base: BaseParams, Form(form): Form<OpenEditorForm>) -> Result<Response> {
    let Some(mut screen) = load(&session, base).await? else {
        return Ok(Redirect::to("/sign-in").into_response());
    };

    match form.note_id {
        Some(note_id) => {
            screen.start_edit_by_id(note_id);
        }
        None => {
            screen.reset_editor();
            screen.create_new();
        }
    }

    store(&session, &screen).await?;
    Ok(back_to_notes(form.theme))
}

/// Applies the typed body and an optional toolbar command, then saves or cancels when asked.
pub(super) async fn submit_editor(session: Session, base: BaseParams, Form(form): Form<EditorForm>) -> Result<Response> {
    let Some(mut screen) = load(&session, base).await? else {
        return Ok(Redirect::to("/sign-in").into_response());
    };

    // a second submit after the first one closed the editor
    if !screen.can_save() {
        return Ok(back_to_notes(form.theme));
    }

    screen.set_title(form.title);
    screen.set_color(form.color);

    let editor = screen.editor_mut();
    if let Some(body) = &form.body {
        editor.update_content(body);
    }
    editor.select_block(form.block);
    if let Some(command) = form.command.as_deref().and_then(|name| EditorCommand::parse(name, &form.href)) {
        editor.toggle_command(command);
    }

    match form.intent {
        Some(Intent::Save) => {
            screen.save().await;
        }
        Some(Intent::Cancel) => screen.reset_editor(),
        None => {}
    }

    store(&session, &screen).await?;
    Ok(back_to_notes(form.theme))
}

pub(super) async fn delete_note(session: Session, base: BaseParams, Form(form): Form<DeleteForm>) -> Result<Response> {
    let Some(mut screen) = load(&session, base).await? else {
        return Ok(Redirect::to("/sign-in").into_response());
    };

    screen.delete_note(form.note_id, |_| form.confirmed).await;

    store(&session, &screen).await?;
    Ok(back_to_notes(form.theme))
}

async fn load(session: &Session, base: BaseParams) -> Result<Option<Screen>> {
    let Some(user_id) = base.ctx.get_user_id() else {
        return Ok(None);
    };

    let view_store = SessionViewModeStore::new(session.clone());
    let mut screen =
        NoteListController::new(ServerActions::new(base), HtmlEditor::new(), view_store, user_id, vec![]).await;

    match session.get::<ScreenState<HtmlEditor>>(SCREEN_KEY).await {
        Ok(Some(state)) => screen.restore(state),
        Ok(None) => {}
        Err(error) => tracing::warn!("dropping unreadable notes screen: {error}"),
    }

    screen.refresh().await;
    Ok(Some(screen))
}

async fn store(session: &Session, screen: &Screen) -> Result<()> {
    session.insert(SCREEN_KEY, screen.screen_state()).await?;
    Ok(())
}

fn back_to_notes(theme: Theme) -> Response {
    let location = match theme {
        Theme::Light => "/notes",
        Theme::Dark => "/notes?theme=dark",
    };

    Redirect::to(location).into_response()
}

fn render(view: &Views, screen: &Screen, user: IdentityUser, notifications: Vec<Notification>, theme: Theme) -> Response {
    let cards = screen
        .filtered_notes()
        .into_iter()
        .map(|note| NoteCard::new(note, theme))
        .collect::<Vec<_>>();

    let colors = NoteColor::ALL
        .iter()
        .map(|color| context! { id => color.as_str(), value => color.value(theme) })
        .collect::<Vec<_>>();

    let editor = screen.is_editor_open().then(|| {
        context! {
            note_id => screen.editing_note_id(),
            title => screen.title(),
            color => screen.color(),
            body => screen.editor().content(),
            can_save => screen.can_save(),
        }
    });

    view.response(
        "notes.html",
        context! {
            user,
            cards,
            colors,
            notifications,
            editor,
            empty_message => screen.empty_message(),
            q => screen.search_query(),
            view_mode => screen.view_mode(),
            other_view => screen.view_mode().toggled(),
            delete_prompt => DELETE_PROMPT,
            theme,
        },
    )
}
