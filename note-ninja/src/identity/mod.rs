//! Accounts live in an external identity provider. This module holds the client
//! for it and the actions that turn its answers into redirects.

pub mod actions;
mod errors;
#[cfg(test)]
pub mod fake;
mod gotrue;
pub mod redirect;
mod routes;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use errors::{Error, Result};
pub use gotrue::GoTrueClient;
pub use redirect::{EncodedRedirect, FormMessage, MessageKind};
pub use routes::router;

pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: UserId,
    pub email: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: IdentityUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

/// PKCE verifier for flows that come back through `/auth/callback?code=`.
/// The challenge uses the `plain` method, so it equals the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeVerifier(String);

impl CodeVerifier {
    pub const METHOD: &'static str = "plain";

    pub fn new() -> Self {
        Self(format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()))
    }

    pub fn challenge(&self) -> &str {
        &self.0
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl Default for CodeVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str, code_challenge: &str) -> Result<()>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Where to send the browser to start an OAuth sign-in.
    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> Result<Url>;

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> Result<AuthSession>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str, code_challenge: &str) -> Result<()>;

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()>;

    /// `None` when the token no longer identifies an account.
    async fn get_user(&self, access_token: &str) -> Result<Option<IdentityUser>>;
}

pub mod middleware {
    use axum::{
        extract::Request,
        middleware::Next,
        response::{IntoResponse, Redirect, Response},
    };

    use crate::{ctx::Ctx, Error, Result};

    pub async fn protected(ctx: Ctx, request: Request, next: Next) -> Result<Response> {
        ctx.user.ok_or(Error::Unauthorized)?;
        Ok(next.run(request).await)
    }

    pub async fn protected_view(ctx: Ctx, request: Request, next: Next) -> Response {
        if ctx.user.is_some() {
            return next.run(request).await;
        }

        Redirect::to("/sign-in").into_response()
    }
}
