use axum::{
    extract::{Query, State},
    http::HeaderMap,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use minijinja::context;
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    config::config,
    ctx::{Ctx, SessionUser, SESSION_USER_KEY},
    db::DB,
    profiles,
    state::AppState,
    views::Views,
    Error, Result,
};

use super::{
    actions::{self, Credentials, ForgotPassword, ResetPassword},
    middleware::protected_view,
    AuthSession, CodeVerifier, EncodedRedirect, FormMessage,
};

const CODE_VERIFIER_KEY: &str = "auth.code_verifier";

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    redirect_to: Option<String>,
    error_description: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/notes/reset-password", get(reset_password_view).post(reset_password))
        .route_layer(middleware::from_fn(protected_view));

    Router::new()
        .route("/sign-in", get(sign_in_view).post(sign_in))
        .route("/sign-up", get(sign_up_view).post(sign_up))
        .route("/auth/google", get(google_sign_in))
        .route("/auth/callback", get(callback))
        .route("/forgot-password", get(forgot_password_view).post(forgot_password))
        .route("/sign-out", post(sign_out))
        .merge(protected)
        .with_state(state)
}

/// Origin the identity provider should send the browser back to.
fn origin(headers: &HeaderMap) -> String {
    headers
        .get("origin")
        .and_then(|origin| origin.to_str().ok())
        .filter(|origin| !origin.is_empty() && *origin != "null")
        .map(String::from)
        .unwrap_or_else(|| config().site_url.clone())
}

async fn remember_verifier(session: &Session) -> Result<CodeVerifier> {
    let verifier = CodeVerifier::new();
    session.insert(CODE_VERIFIER_KEY, &verifier).await?;
    Ok(verifier)
}

async fn establish_session(session: &Session, db: &DB, auth: AuthSession) -> Result<()> {
    session.cycle_id().await?;

    let user = SessionUser {
        id: auth.user.id,
        email: auth.user.email,
        access_token: auth.access_token,
    };
    profiles::ensure_profile(db, user.id, user.email.clone()).await?;

    tracing::info!(user_id = %user.id, "signed in");
    session.insert(SESSION_USER_KEY, user).await?;
    Ok(())
}

async fn sign_in_view(view: Views, ctx: Ctx, Query(message): Query<FormMessage>) -> Response {
    view.response("sign-in.html", context! { message, user => ctx.user })
}

async fn sign_in(State(state): State<AppState>, session: Session, Form(form): Form<Credentials>) -> Result<Response> {
    match actions::sign_in(state.identity.as_ref(), form).await {
        Ok(auth) => {
            establish_session(&session, &state.conn, auth).await?;
            Ok(Redirect::to(actions::AFTER_SIGN_IN).into_response())
        }
        Err(redirect) => Ok(redirect.into_response()),
    }
}

async fn sign_up_view(view: Views, ctx: Ctx, Query(message): Query<FormMessage>) -> Response {
    view.response("sign-up.html", context! { message, user => ctx.user })
}

async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<Credentials>,
) -> Result<EncodedRedirect> {
    let verifier = remember_verifier(&session).await?;

    Ok(actions::sign_up(state.identity.as_ref(), form, &origin(&headers), &verifier).await)
}

async fn google_sign_in(State(state): State<AppState>, session: Session, headers: HeaderMap) -> Result<Response> {
    let config = config();
    let redirect_to = config
        .oauth_redirect_url
        .clone()
        .unwrap_or_else(|| actions::callback_url(&origin(&headers), Some(actions::AFTER_SIGN_IN)));

    let verifier = remember_verifier(&session).await?;

    match actions::authorize(state.identity.as_ref(), &config.oauth_provider, &redirect_to, &verifier) {
        Ok(url) => Ok(Redirect::to(&url).into_response()),
        Err(redirect) => Ok(redirect.into_response()),
    }
}

async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let Some(code) = query.code else {
        let message = query
            .error_description
            .unwrap_or_else(|| "Missing authorization code".into());
        return Ok(EncodedRedirect::error("/sign-in", message).into_response());
    };

    let verifier = session.remove::<CodeVerifier>(CODE_VERIFIER_KEY).await?;

    let exchanged = actions::exchange_code(
        state.identity.as_ref(),
        &code,
        verifier,
        query.redirect_to.as_deref(),
    )
    .await;

    match exchanged {
        Ok((auth, next)) => {
            establish_session(&session, &state.conn, auth).await?;
            Ok(Redirect::to(&next).into_response())
        }
        Err(redirect) => Ok(redirect.into_response()),
    }
}

async fn forgot_password_view(view: Views, ctx: Ctx, Query(message): Query<FormMessage>) -> Response {
    view.response("forgot-password.html", context! { message, user => ctx.user })
}

async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ForgotPassword>,
) -> Result<Response> {
    let verifier = remember_verifier(&session).await?;

    Ok(actions::forgot_password(state.identity.as_ref(), form, &origin(&headers), &verifier)
        .await
        .into_response())
}

async fn reset_password_view(view: Views, ctx: Ctx, Query(message): Query<FormMessage>) -> Response {
    view.response("reset-password.html", context! { message, user => ctx.user })
}

async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetPassword>,
) -> Result<EncodedRedirect> {
    let user = session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await?
        .ok_or(Error::Unauthorized)?;

    Ok(actions::reset_password(state.identity.as_ref(), &user.access_token, form).await)
}

async fn sign_out(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if let Some(user) = session.get::<SessionUser>(SESSION_USER_KEY).await? {
        if let Err(error) = state.identity.sign_out(&user.access_token).await {
            tracing::warn!("sign out failed: {error}");
        }
        tracing::info!(user_id = %user.id, "signed out");
    }

    session.flush().await?;
    Ok(Redirect::to("/sign-in"))
}
