use rusqlite::{named_params, OptionalExtension, Row};

use crate::{ctx::BaseParams, db, db::DB, identity::UserId, Error, Result};

use super::{Profile, UpdateProfile};

impl<'a> TryFrom<&Row<'a>> for Profile {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            avatar_url: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

/// Creates the empty profile of a user on first sign-in. Existing profiles are left alone.
pub async fn ensure_profile(db: &DB, user_id: UserId, email: Option<String>) -> Result<()> {
    db.call(move |conn| {
        conn.execute(
            "INSERT OR IGNORE INTO profiles (id, email, created_at) VALUES (:id, :email, :created_at)",
            named_params! {
                ":id": user_id,
                ":email": email,
                ":created_at": chrono::Utc::now(),
            },
        )?;
        Ok(())
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn get_profile(user_id: UserId, BaseParams { db, ctx }: BaseParams) -> Result<Option<Profile>> {
    db.call(move |conn| {
        conn.query_row(
            r#"SELECT id, email, name, avatar_url, created_at, updated_at FROM profiles
            WHERE id = :id AND (:owner IS NULL OR id = :owner)"#,
            named_params! {
                ":id": user_id,
                ":owner": ctx.get_user_id(),
            },
            |row| Profile::try_from(row),
        )
        .optional()
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(Error::from)
}

pub async fn update_profile(
    UpdateProfile {
        name,
        avatar_url,
        user_id,
    }: UpdateProfile,
    BaseParams { db, ctx }: BaseParams,
) -> Result<Profile> {
    let user_id = match user_id {
        Some(user_id) if !name.trim().is_empty() && !avatar_url.trim().is_empty() => user_id,
        _ => return Err(Error::Validation("Name, avatar URL, and user ID are required".into())),
    };

    let profile = db
        .call(move |conn| {
            conn.query_row(
                r#"UPDATE profiles SET name = :name, avatar_url = :avatar_url, updated_at = :updated_at
                WHERE id = :id AND (:owner IS NULL OR id = :owner)
                RETURNING id, email, name, avatar_url, created_at, updated_at"#,
                named_params! {
                    ":name": name.trim(),
                    ":avatar_url": avatar_url.trim(),
                    ":updated_at": chrono::Utc::now(),
                    ":id": user_id,
                    ":owner": ctx.get_user_id(),
                },
                |row| Profile::try_from(row),
            )
            .map_err(|e| e.into())
        })
        .await
        .map_err(db::Error::from)
        .map_err(|e| e.not_found_message("Profile not found"))
        .map_err(Error::from)?;

    tracing::debug!(user_id = %profile.id, "profile updated");
    Ok(profile)
}
