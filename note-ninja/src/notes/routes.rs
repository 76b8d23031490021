use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};

use crate::{
    ctx::BaseParams,
    identity::middleware::{protected, protected_view},
    state::AppState,
    Result,
};

use super::{actions, page, CreateNote, DeleteNoteResponse, FindNotesResponse, Note, NoteForm, NoteId, UpdateNote};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/notes", get(find_notes).post(create_note))
        .route("/api/v1/notes/{note_id}", patch(update_note).delete(delete_note))
        .route_layer(middleware::from_fn(protected));

    let pages = Router::new()
        .route("/notes", get(page::notes_view))
        .route("/notes/editor", post(page::submit_editor))
        .route("/notes/editor/open", post(page::open_editor))
        .route("/notes/delete", post(page::delete_note))
        .route_layer(middleware::from_fn(protected_view));

    Router::new().merge(api).merge(pages).with_state(state)
}

async fn find_notes(base: BaseParams) -> Result<Json<FindNotesResponse>> {
    let user_id = base.ctx.get_user_id();

    actions::list_notes(user_id, base)
        .await
        .map(|results| Json(FindNotesResponse { results }))
}

async fn create_note(base: BaseParams, Json(form): Json<NoteForm>) -> Result<(StatusCode, Json<Note>)> {
    let args = CreateNote {
        title: form.title,
        description: form.description,
        color: form.color,
        user_id: base.ctx.get_user_id(),
    };

    actions::add_note(args, base)
        .await
        .map(|note| (StatusCode::CREATED, Json(note)))
}

async fn update_note(
    Path(note_id): Path<NoteId>,
    base: BaseParams,
    Json(form): Json<NoteForm>,
) -> Result<Json<Note>> {
    let args = UpdateNote {
        note_id: Some(note_id),
        title: form.title,
        description: form.description,
        color: form.color,
    };

    actions::update_note(args, base).await.map(Json)
}

async fn delete_note(Path(note_id): Path<NoteId>, base: BaseParams) -> Result<Json<DeleteNoteResponse>> {
    actions::delete_note(Some(note_id), base)
        .await
        .map(|success| Json(DeleteNoteResponse { success }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use crate::{
        db::init_test_db,
        errors::{ErrorResponse, Result},
        identity::fake::ADA_ID,
        notes::{DeleteNoteResponse, FindNotesResponse, Note, NoteColor},
        tests::{sign_in_as_ada, test_server},
    };

    #[tokio::test]
    async fn api_requires_sign_in() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;

        let response = server.get("/api/v1/notes").await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<ErrorResponse>().error, "unauthorized");
        Ok(())
    }

    #[tokio::test]
    async fn create_list_update_delete() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        sign_in_as_ada(&server).await;

        let response = server
            .post("/api/v1/notes")
            .json(&json!({ "title": "Groceries", "description": "<p>milk</p>", "color": "blue" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let note = response.json::<Note>();
        assert_eq!(note.user_id, ADA_ID);
        assert_eq!(note.color, NoteColor::Blue);

        let listed = server.get("/api/v1/notes").await.json::<FindNotesResponse>();
        assert_eq!(listed.results, [note.clone()]);

        let response = server
            .patch(&format!("/api/v1/notes/{}", note.id))
            .json(&json!({ "title": "Groceries", "description": "<p>milk, eggs</p>", "color": "mauve" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let updated = response.json::<Note>();
        assert_eq!(updated.description, "<p>milk, eggs</p>");
        assert_eq!(updated.color, NoteColor::Gray);
        assert_eq!(updated.created_at, note.created_at);

        let response = server.delete(&format!("/api/v1/notes/{}", note.id)).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.json::<DeleteNoteResponse>().success);

        let response = server.delete(&format!("/api/v1/notes/{}", note.id)).await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<ErrorResponse>().message.as_deref(), Some("Note not found"));
        Ok(())
    }

    #[tokio::test]
    async fn create_without_title_is_rejected() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        sign_in_as_ada(&server).await;

        let response = server
            .post("/api/v1/notes")
            .json(&json!({ "title": " ", "description": "body" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<ErrorResponse>().message.as_deref(),
            Some("Title, description, and user ID are required")
        );
        assert!(server.get("/api/v1/notes").await.json::<FindNotesResponse>().results.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_of_unknown_note_is_store_error() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        sign_in_as_ada(&server).await;

        let response = server
            .patch(&format!("/api/v1/notes/{}", Uuid::now_v7()))
            .json(&json!({ "title": "x", "description": "y" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    #[tokio::test]
    async fn notes_page_renders_cards_and_search() -> Result<()> {
        let server = test_server(init_test_db().await?).await?;
        sign_in_as_ada(&server).await;

        let page = server.get("/notes").await;
        assert_eq!(page.status_code(), StatusCode::OK);
        assert!(page.text().contains("No notes yet. Create your first note!"));

        server
            .post("/api/v1/notes")
            .json(&json!({ "title": "Groceries", "description": "see https://example.com <script>x</script>", "color": "teal" }))
            .await;

        let page = server.get("/notes").add_query_param("theme", "dark").await.text();
        assert!(page.contains("Groceries"));
        assert!(page.contains("#040F0F"));
        assert!(page.contains(r#"rel="noopener noreferrer""#));
        assert!(!page.contains("<script>x"));

        let page = server.get("/notes").add_query_param("q", "bread").await.text();
        assert!(page.contains("No notes match your search."));
        Ok(())
    }
}
