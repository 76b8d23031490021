use axum::{response::Response, routing::get, Router};
use minijinja::context;

use crate::{ctx::Ctx, state::AppState, views::Views};

pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(home)).with_state(state)
}

async fn home(view: Views, ctx: Ctx) -> Response {
    view.response("home.html", context! { user => ctx.user })
}
