use axum::response::{IntoResponse, Redirect, Response};
use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Error,
    Success,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Error => "error",
            MessageKind::Success => "success",
        }
    }
}

/// Redirect to a page with a message in its query string, e.g. `/sign-in?error=Invalid+login+credentials`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRedirect {
    pub kind: MessageKind,
    pub path: String,
    pub message: String,
}

impl EncodedRedirect {
    pub fn new(kind: MessageKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, path, message)
    }

    pub fn success(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(MessageKind::Success, path, message)
    }

    pub fn to_url(&self) -> String {
        let query = Url::parse_with_params("http://localhost/", [(self.kind.as_str(), self.message.as_str())])
            .ok()
            .and_then(|url| url.query().map(str::to_string))
            .unwrap_or_default();

        format!("{}?{query}", self.path)
    }
}

impl IntoResponse for EncodedRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.to_url()).into_response()
    }
}

/// Message panel of the auth and profile pages, read back from the query string.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormMessage {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl From<EncodedRedirect> for FormMessage {
    fn from(redirect: EncodedRedirect) -> Self {
        match redirect.kind {
            MessageKind::Error => Self {
                error: Some(redirect.message),
                ..Default::default()
            },
            MessageKind::Success => Self {
                success: Some(redirect.message),
                ..Default::default()
            },
        }
    }
}

/// Keeps post-callback redirects on this site.
pub fn local_path(path: Option<&str>) -> Option<&str> {
    path.filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(location: &str) -> (String, FormMessage) {
        let url = Url::parse("http://localhost").unwrap().join(location).unwrap();
        let mut message = FormMessage::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "error" => message.error = Some(value.into_owned()),
                "success" => message.success = Some(value.into_owned()),
                _ => {}
            }
        }

        (url.path().to_string(), message)
    }

    #[test]
    fn message_survives_the_query_string() {
        let redirect = EncodedRedirect::error("/sign-in", "Invalid login credentials & more?");

        let (path, message) = read_back(&redirect.to_url());

        assert_eq!(path, "/sign-in");
        assert_eq!(message, FormMessage::from(redirect));
        assert_eq!(message.error.as_deref(), Some("Invalid login credentials & more?"));
    }

    #[test]
    fn success_uses_its_own_key() {
        let redirect = EncodedRedirect::success("/notes/reset-password", "Password updated");

        assert_eq!(redirect.to_url(), "/notes/reset-password?success=Password+updated");
    }

    #[test]
    fn only_local_paths_are_followed() {
        assert_eq!(local_path(Some("/notes/reset-password")), Some("/notes/reset-password"));
        assert_eq!(local_path(Some("//evil.example.com")), None);
        assert_eq!(local_path(Some("https://evil.example.com")), None);
        assert_eq!(local_path(None), None);
    }
}
