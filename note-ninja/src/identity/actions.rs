//! Auth form handlers without the HTTP layer. Each one ends in a redirect.

use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use super::{redirect::local_path, AuthSession, CodeVerifier, EncodedRedirect, IdentityProvider};

pub const AFTER_SIGN_IN: &str = "/notes";
pub const RESET_PASSWORD_PATH: &str = "/notes/reset-password";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ForgotPassword {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResetPassword {
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionRedirect {
    Message(EncodedRedirect),
    To(String),
}

impl From<EncodedRedirect> for ActionRedirect {
    fn from(redirect: EncodedRedirect) -> Self {
        Self::Message(redirect)
    }
}

impl IntoResponse for ActionRedirect {
    fn into_response(self) -> Response {
        match self {
            ActionRedirect::Message(redirect) => redirect.into_response(),
            ActionRedirect::To(location) => Redirect::to(&location).into_response(),
        }
    }
}

/// `{origin}/auth/callback`, optionally continuing to `next` once the code is exchanged.
pub fn callback_url(origin: &str, next: Option<&str>) -> String {
    let origin = origin.trim_end_matches('/');
    match next {
        Some(next) => format!("{origin}/auth/callback?redirect_to={next}"),
        None => format!("{origin}/auth/callback"),
    }
}

pub async fn sign_up(
    identity: &dyn IdentityProvider,
    Credentials { email, password }: Credentials,
    origin: &str,
    verifier: &CodeVerifier,
) -> EncodedRedirect {
    if email.trim().is_empty() || password.is_empty() {
        return EncodedRedirect::error("/sign-up", "Email and password are required");
    }

    let result = identity
        .sign_up(email.trim(), &password, &callback_url(origin, None), verifier.challenge())
        .await;

    match result {
        Ok(()) => EncodedRedirect::success(
            "/sign-up",
            "Thanks for signing up! Please check your email for a verification link.",
        ),
        Err(error) => {
            tracing::error!("sign up failed: {error}");
            EncodedRedirect::error("/sign-up", error.to_string())
        }
    }
}

pub async fn sign_in(
    identity: &dyn IdentityProvider,
    Credentials { email, password }: Credentials,
) -> Result<AuthSession, EncodedRedirect> {
    identity
        .sign_in_with_password(email.trim(), &password)
        .await
        .map_err(|error| EncodedRedirect::error("/sign-in", error.to_string()))
}

/// Starts an OAuth sign-in. Failures go back to the sign-in page.
pub fn authorize(
    identity: &dyn IdentityProvider,
    provider: &str,
    redirect_to: &str,
    verifier: &CodeVerifier,
) -> Result<String, EncodedRedirect> {
    identity
        .authorize_url(provider, redirect_to, verifier.challenge())
        .map(String::from)
        .map_err(|error| EncodedRedirect::error("/sign-in", error.to_string()))
}

/// Finishes a flow that came back with `?code=`. Returns the session and where to go next.
pub async fn exchange_code(
    identity: &dyn IdentityProvider,
    code: &str,
    verifier: Option<CodeVerifier>,
    redirect_to: Option<&str>,
) -> Result<(AuthSession, String), EncodedRedirect> {
    let Some(verifier) = verifier else {
        return Err(EncodedRedirect::error("/sign-in", "Sign-in link expired, please try again"));
    };

    let session = identity
        .exchange_code(code, verifier.secret())
        .await
        .map_err(|error| EncodedRedirect::error("/sign-in", error.to_string()))?;

    let next = local_path(redirect_to).unwrap_or(AFTER_SIGN_IN).to_string();
    Ok((session, next))
}

pub async fn forgot_password(
    identity: &dyn IdentityProvider,
    ForgotPassword { email, callback_url: next }: ForgotPassword,
    origin: &str,
    verifier: &CodeVerifier,
) -> ActionRedirect {
    if email.trim().is_empty() {
        return EncodedRedirect::error("/forgot-password", "Email is required").into();
    }

    let redirect_to = callback_url(origin, Some(RESET_PASSWORD_PATH));
    let result = identity
        .reset_password_for_email(email.trim(), &redirect_to, verifier.challenge())
        .await;

    if let Err(error) = result {
        tracing::error!("password reset request failed: {error}");
        return EncodedRedirect::error("/forgot-password", "Could not reset password").into();
    }

    if let Some(next) = local_path(next.as_deref()) {
        return ActionRedirect::To(next.to_string());
    }

    EncodedRedirect::success(
        "/forgot-password",
        "Check your email for a link to reset your password.",
    )
    .into()
}

pub async fn reset_password(
    identity: &dyn IdentityProvider,
    access_token: &str,
    ResetPassword {
        password,
        confirm_password,
    }: ResetPassword,
) -> EncodedRedirect {
    if password.is_empty() || confirm_password.is_empty() {
        return EncodedRedirect::error(RESET_PASSWORD_PATH, "Password and confirm password are required");
    }

    if password != confirm_password {
        return EncodedRedirect::error(RESET_PASSWORD_PATH, "Passwords do not match");
    }

    if let Err(error) = identity.update_password(access_token, &password).await {
        tracing::warn!("password update failed: {error}");
        return EncodedRedirect::error(RESET_PASSWORD_PATH, "Password update failed");
    }

    EncodedRedirect::success(RESET_PASSWORD_PATH, "Password updated")
}
