use rusqlite::{named_params, Row};

use crate::{ctx::BaseParams, db, identity::UserId, Error, Result};

use super::{CreateNote, Note, NoteId, UpdateNote};

impl<'a> TryFrom<&Row<'a>> for Note {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            color: row.get(3)?,
            created_at: row.get(4)?,
            user_id: row.get(5)?,
        })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub async fn add_note(
    CreateNote {
        title,
        description,
        color,
        user_id,
    }: CreateNote,
    BaseParams { db, ctx }: BaseParams,
) -> Result<Note> {
    let user_id = match user_id {
        Some(user_id) if !is_blank(&title) && !is_blank(&description) => user_id,
        _ => return Err(Error::Validation("Title, description, and user ID are required".into())),
    };

    if ctx.get_user_id().is_some_and(|owner| owner != user_id) {
        return Err(Error::Forbidden);
    }

    let note = db
        .call(move |conn| {
            conn.query_row(
                r#"INSERT INTO notes (title, description, color, user_id, created_at)
                VALUES (:title, :description, :color, :user_id, :created_at)
                RETURNING id, title, description, color, created_at, user_id"#,
                named_params! {
                    ":title": title,
                    ":description": description,
                    ":color": color,
                    ":user_id": user_id,
                    ":created_at": chrono::Utc::now(),
                },
                |row| Note::try_from(row),
            )
            .map_err(|e| e.into())
        })
        .await
        .map_err(db::Error::from)
        .map_err(Error::from)?;

    tracing::debug!(note_id = %note.id, "note added");
    Ok(note)
}

pub async fn update_note(
    UpdateNote {
        note_id,
        title,
        description,
        color,
    }: UpdateNote,
    BaseParams { db, ctx }: BaseParams,
) -> Result<Note> {
    let note_id = match note_id {
        Some(note_id) if !is_blank(&title) && !is_blank(&description) => note_id,
        _ => return Err(Error::Validation("Note ID, title, and description are required".into())),
    };

    db.call(move |conn| {
        conn.query_row(
            r#"UPDATE notes SET title = :title, description = :description, color = :color
            WHERE id = :id AND (:owner IS NULL OR user_id = :owner)
            RETURNING id, title, description, color, created_at, user_id"#,
            named_params! {
                ":title": title,
                ":description": description,
                ":color": color,
                ":id": note_id,
                ":owner": ctx.get_user_id(),
            },
            |row| Note::try_from(row),
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| e.not_found_message("Note not found"))
    .map_err(Error::from)
}

/// All notes of `user_id`, newest first.
pub async fn list_notes(user_id: Option<UserId>, BaseParams { db, ctx }: BaseParams) -> Result<Vec<Note>> {
    let user_id = user_id.ok_or_else(|| Error::Validation("User ID is required".into()))?;

    db.call(move |conn| {
        let notes = conn
            .prepare(
                r#"SELECT id, title, description, color, created_at, user_id FROM notes
                WHERE user_id = :user_id AND (:owner IS NULL OR user_id = :owner)
                ORDER BY created_at DESC, rowid DESC"#,
            )?
            .query_map(
                named_params! {
                    ":user_id": user_id,
                    ":owner": ctx.get_user_id(),
                },
                |row| Note::try_from(row),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

/// Hard delete. Deleting a note that is already gone is an error, not a no-op.
pub async fn delete_note(note_id: Option<NoteId>, BaseParams { db, ctx }: BaseParams) -> Result<bool> {
    let note_id = note_id.ok_or_else(|| Error::Validation("Note ID is required".into()))?;

    db.call(move |conn| {
        conn.query_row(
            r#"DELETE FROM notes
            WHERE id = :id AND (:owner IS NULL OR user_id = :owner)
            RETURNING id"#,
            named_params! {
                ":id": note_id,
                ":owner": ctx.get_user_id(),
            },
            |row| row.get::<_, NoteId>(0),
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| e.not_found_message("Note not found"))
    .map_err(Error::from)?;

    tracing::debug!(%note_id, "note deleted");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use uuid::{uuid, Uuid};

    use super::*;
    use crate::{
        ctx::{Ctx, User},
        db::{init_test_db, DB},
        notes::NoteColor,
    };

    const USER_ID: Uuid = uuid!("018f6146-32f4-7948-8289-cfb5cdb2b2af");

    fn base(db: DB, user_id: Option<Uuid>) -> BaseParams {
        BaseParams::new(db, Ctx::new(user_id.map(|id| User { id, email: None })))
    }

    fn groceries(user_id: Option<Uuid>) -> CreateNote {
        CreateNote {
            title: "Groceries".into(),
            description: "milk, eggs".into(),
            color: NoteColor::Blue,
            user_id,
        }
    }

    #[tokio::test]
    async fn add_then_list_returns_newest_first() -> Result<()> {
        let db = init_test_db().await?;

        let older = add_note(
            CreateNote {
                title: "Older".into(),
                description: "first".into(),
                color: NoteColor::Red,
                user_id: Some(USER_ID),
            },
            base(db.clone(), None),
        )
        .await?;
        let note = add_note(groceries(Some(USER_ID)), base(db.clone(), None)).await?;

        assert!(!note.id.is_nil());
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.color, NoteColor::Blue);
        assert_eq!(note.user_id, USER_ID);

        let notes = list_notes(Some(USER_ID), base(db, None)).await?;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], note);
        assert_eq!(notes[1].id, older.id);
        Ok(())
    }

    #[tokio::test]
    async fn add_requires_fields() -> Result<()> {
        let db = init_test_db().await?;

        let missing_user = add_note(groceries(None), base(db.clone(), None)).await;
        assert!(matches!(missing_user, Err(Error::Validation(_))));

        let blank_title = add_note(
            CreateNote {
                title: "  ".into(),
                ..groceries(Some(USER_ID))
            },
            base(db.clone(), None),
        )
        .await;
        assert!(matches!(blank_title, Err(Error::Validation(_))));

        let empty_description = add_note(
            CreateNote {
                description: "".into(),
                ..groceries(Some(USER_ID))
            },
            base(db.clone(), None),
        )
        .await;
        assert!(matches!(empty_description, Err(Error::Validation(_))));

        assert!(list_notes(Some(USER_ID), base(db, None)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn add_for_another_account_is_forbidden() -> Result<()> {
        let db = init_test_db().await?;

        let result = add_note(groceries(Some(Uuid::now_v7())), base(db, Some(USER_ID))).await;

        assert!(matches!(result, Err(Error::Forbidden)));
        Ok(())
    }

    #[tokio::test]
    async fn update_changes_only_editable_fields() -> Result<()> {
        let db = init_test_db().await?;
        let note = add_note(groceries(Some(USER_ID)), base(db.clone(), None)).await?;

        let updated = update_note(
            UpdateNote {
                note_id: Some(note.id),
                title: "Groceries (weekend)".into(),
                description: "<p>milk, eggs, <strong>bread</strong></p>".into(),
                color: NoteColor::Green,
            },
            base(db, Some(USER_ID)),
        )
        .await?;

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.user_id, note.user_id);
        assert_eq!(updated.created_at, note.created_at);
        assert_eq!(updated.title, "Groceries (weekend)");
        assert_eq!(updated.color, NoteColor::Green);
        Ok(())
    }

    #[tokio::test]
    async fn update_of_missing_note_is_store_error() -> Result<()> {
        let db = init_test_db().await?;

        let result = update_note(
            UpdateNote {
                note_id: Some(Uuid::now_v7()),
                title: "x".into(),
                description: "y".into(),
                color: NoteColor::Red,
            },
            base(db, None),
        )
        .await;

        assert!(matches!(result, Err(Error::Store(msg)) if msg == "Note not found"));
        Ok(())
    }

    #[tokio::test]
    async fn update_requires_note_id() -> Result<()> {
        let db = init_test_db().await?;

        let result = update_note(
            UpdateNote {
                note_id: None,
                title: "x".into(),
                description: "y".into(),
                color: NoteColor::Red,
            },
            base(db, None),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn other_accounts_notes_are_invisible() -> Result<()> {
        let db = init_test_db().await?;
        let note = add_note(groceries(Some(USER_ID)), base(db.clone(), None)).await?;
        let stranger = Some(Uuid::now_v7());

        let listed = list_notes(Some(USER_ID), base(db.clone(), stranger)).await?;
        assert!(listed.is_empty());

        let deleted = delete_note(Some(note.id), base(db.clone(), stranger)).await;
        assert!(matches!(deleted, Err(Error::Store(_))));

        assert_eq!(list_notes(Some(USER_ID), base(db, None)).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_twice_fails_the_second_time() -> Result<()> {
        let db = init_test_db().await?;
        let note = add_note(groceries(Some(USER_ID)), base(db.clone(), None)).await?;

        assert!(delete_note(Some(note.id), base(db.clone(), Some(USER_ID))).await?);
        assert!(list_notes(Some(USER_ID), base(db.clone(), None))
            .await?
            .iter()
            .all(|n| n.id != note.id));

        let again = delete_note(Some(note.id), base(db, Some(USER_ID))).await;
        assert!(matches!(again, Err(Error::Store(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_and_delete_require_ids() -> Result<()> {
        let db = init_test_db().await?;

        assert!(matches!(list_notes(None, base(db.clone(), None)).await, Err(Error::Validation(_))));
        assert!(matches!(delete_note(None, base(db, None)).await, Err(Error::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_stored_color_reads_as_gray() -> Result<()> {
        let db = init_test_db().await?;

        db.call(|conn| {
            conn.execute(
                "INSERT INTO notes (title, description, color, user_id) VALUES ('t', 'd', 'chartreuse', ?1)",
                [USER_ID],
            )?;
            Ok(())
        })
        .await
        .map_err(db::Error::from)?;

        let notes = list_notes(Some(USER_ID), base(db, None)).await?;
        assert_eq!(notes[0].color, NoteColor::Gray);
        Ok(())
    }
}
