use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{db::DB, identity::UserId, Error};

pub const SESSION_USER_KEY: &str = "auth.user";

#[derive(Clone, Debug, FromRequestParts)]
pub struct BaseParams {
    pub ctx: Ctx,
    #[from_request(via(Extension))]
    pub db: DB,
}

impl BaseParams {
    pub fn new(db: DB, ctx: Ctx) -> Self {
        Self { db, ctx }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
}

/// What the session remembers about the signed-in account.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Option<String>,
    pub access_token: String,
}

impl std::fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

impl From<SessionUser> for User {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ctx {
    pub user: Option<User>,
}

impl Ctx {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }

    pub fn get_user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }
}

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        let user = session
            .get::<SessionUser>(SESSION_USER_KEY)
            .await
            .map_err(|e| Error::from(e).into_response())?
            .map(User::from);

        Ok(Self { user })
    }
}
