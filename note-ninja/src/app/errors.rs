use std::sync::{Arc, OnceLock};

use crate::error_responses;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{db, identity};

pub use response::ErrorResponse;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required field is missing. Raised before the store is touched.
    #[error("{0}")]
    Validation(String),

    /// The data store refused the operation. The message is shown to the user as is.
    #[error("{0}")]
    Store(String),

    // auth
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    Identity(String),

    // other
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl From<db::Error> for Error {
    fn from(error: db::Error) -> Self {
        match error {
            db::Error::NotFound(msg) => Self::Store(msg),
            error => Self::Store(error.to_string()),
        }
    }
}

impl From<identity::Error> for Error {
    fn from(error: identity::Error) -> Self {
        match error {
            identity::Error::Api { message, .. } => Self::Identity(message),
            error => Self::Unexpected(error.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for Error {
    fn from(error: tower_sessions::session::Error) -> Self {
        Self::Unexpected(error.to_string())
    }
}

impl From<minijinja::Error> for Error {
    fn from(error: minijinja::Error) -> Self {
        Self::Unexpected(error.to_string())
    }
}

// Response

error_responses! {
    validation: 400,
    store: 422,
    unauthorized: 401,
    forbidden: 403,
    identity: 400,
    unexpected: 500
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        let errors = errors();
        match error {
            Error::Validation(message) => errors.validation.with_message(message),
            Error::Store(message) => errors.store.with_message(message),
            Error::Unauthorized => errors.unauthorized.with_message("Unauthorized"),
            Error::Forbidden => errors.forbidden.with_message("Forbidden"),
            Error::Identity(message) => errors.identity.with_message(message),
            Error::Unexpected(_) => errors.unexpected.with_message("Unexpected"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let error = Arc::new(self);

        let error_res = ErrorResponse::from(error.as_ref());
        let status = StatusCode::from_u16(error_res.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut res = axum::Json(error_res).into_response();
        res.extensions_mut().insert(error);

        *res.status_mut() = status;
        res
    }
}

pub async fn on_error(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let error = response.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    match error {
        Some(error @ (Error::Store(_) | Error::Unexpected(_))) => tracing::error!("{:?}", error),
        Some(error) => tracing::warn!("{:?}", error),
        None => {}
    }

    response
}

mod response {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
    pub struct ErrorResponse {
        pub error: String,
        pub message: Option<String>,
        pub status: u16,
    }

    impl ErrorResponse {
        pub fn new(error: impl Into<String>, status: u16) -> Self {
            Self {
                error: error.into(),
                status,
                ..Default::default()
            }
        }

        pub fn with_message(&self, message: impl Into<String>) -> Self {
            let mut res = self.clone();
            res.message = Some(message.into());
            res
        }
    }

    /// Typed error responses, one per error kind
    /// ```ignore
    /// error_responses! {
    ///     store: 422,
    ///     unexpected: 500
    /// }
    ///
    /// let errors = errors(); // <- from macro
    /// errors.store.with_message("Note not found");
    /// ```
    #[macro_export]
    macro_rules! error_responses {
        (
            $($name:ident: $code:expr),* $(,)?
        ) => {
            #[derive(Debug, Clone, Serialize)]
            struct Responses {
                $(
                    $name: ErrorResponse,
                )*
            }

            static ERRORS: OnceLock<Responses> = OnceLock::new();

            fn errors() -> &'static Responses {
                ERRORS.get_or_init(|| Responses {
                    $(
                        $name: ErrorResponse::new(stringify!($name), $code),
                    )*
                })
            }
        };
    }
}
