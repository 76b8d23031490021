use std::sync::Arc;

use axum_macros::FromRef;

use crate::{db::DB, identity::IdentityProvider, shared::views::Views};

#[derive(FromRef, Clone)]
pub struct AppState {
    pub conn: DB,
    pub views: Views,
    pub identity: Arc<dyn IdentityProvider>,
}
