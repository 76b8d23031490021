use axum::{
    extract::Query,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use minijinja::context;

use crate::{
    ctx::BaseParams,
    identity::{middleware::protected_view, EncodedRedirect, FormMessage},
    state::AppState,
    views::Views,
    Error, Result,
};

use super::{actions, UpdateProfile};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(profile_view).post(update_profile))
        .route_layer(middleware::from_fn(protected_view))
        .with_state(state)
}

async fn profile_view(view: Views, base: BaseParams, Query(message): Query<FormMessage>) -> Result<Response> {
    let user = base.ctx.user.clone().ok_or(Error::Unauthorized)?;
    let profile = actions::get_profile(user.id, base).await?;

    Ok(view.response("profile.html", context! { profile, message, user }))
}

async fn update_profile(base: BaseParams, Form(form): Form<UpdateProfile>) -> Result<Response> {
    match actions::update_profile(form, base).await {
        Ok(_) => Ok(Redirect::to("/profile").into_response()),
        Err(Error::Validation(message) | Error::Store(message)) => {
            Ok(EncodedRedirect::error("/profile", message).into_response())
        }
        Err(error) => Err(error),
    }
}
