use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use minijinja::{Environment, Error};

const TEMPLATES: [(&str, &str); 8] = [
    ("base.html", include_str!("../views/base.html")),
    ("home.html", include_str!("../views/home.html")),
    ("notes.html", include_str!("../views/notes.html")),
    ("sign-in.html", include_str!("../views/sign-in.html")),
    ("sign-up.html", include_str!("../views/sign-up.html")),
    ("forgot-password.html", include_str!("../views/forgot-password.html")),
    ("reset-password.html", include_str!("../views/reset-password.html")),
    ("profile.html", include_str!("../views/profile.html")),
];

/// Environment with every page template loaded.
pub fn environment() -> Result<Environment<'static>, Error> {
    let mut env = Environment::new();
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Chainable);

    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }

    Ok(env)
}

#[derive(Debug, Clone)]
pub struct Views {
    pub env: Arc<Environment<'static>>,
}

impl Views {
    pub fn new(env: Environment<'static>) -> Self {
        let engine = Arc::new(env);
        Self { env: engine }
    }
}

impl Views {
    pub fn response<D: serde::Serialize>(&self, key: &str, data: D) -> Response {
        match self.render(key, data) {
            Ok(x) => Html(x).into_response(),
            Err(err) => {
                tracing::error!("failed to render {key}: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }

    /// Renders a template, or a single block of it with `template#block`.
    pub fn render<D: serde::Serialize>(&self, key: &str, data: D) -> Result<String, Error> {
        if let Some((template_name, block_name)) = key.split_once('#') {
            let template = self.env.get_template(template_name)?;
            let mut captured = template.render_captured(&data)?;
            let rendered = captured.with_state_mut(|state| state.render_block(block_name))?;

            return Ok(rendered);
        }

        let template = self.env.get_template(key)?;
        let rendered = template.render(&data)?;

        Ok(rendered)
    }
}

impl<ApplicationState> FromRequestParts<ApplicationState> for Views
where
    Self: FromRef<ApplicationState>,
    ApplicationState: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_: &mut Parts, state: &ApplicationState) -> Result<Self, Self::Rejection> {
        Ok(Self::from_ref(state))
    }
}
