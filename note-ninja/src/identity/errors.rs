use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider answered with an error. `message` is meant for the user.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid identity configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The provider is not consistent about which field carries the message.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ApiErrorBody {
    pub error_description: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message).or(self.error)
    }
}
