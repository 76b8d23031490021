mod actions;
mod routes;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

pub use actions::{ensure_profile, get_profile, update_profile};
pub use routes::router;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "avatarUrl")]
    pub avatar_url: String,
    #[serde(rename = "userId")]
    pub user_id: Option<UserId>,
}
