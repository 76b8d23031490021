use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tower_sessions::Session;

pub const VIEW_MODE_KEY: &str = "viewMode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "grid" => Some(ViewMode::Grid),
            "list" => Some(ViewMode::List),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),
}

/// Client-local storage of the preferred layout.
#[async_trait]
pub trait ViewModeStore: Send + Sync {
    /// `None` when nothing usable is stored.
    async fn load(&self) -> Option<ViewMode>;

    async fn save(&self, mode: ViewMode) -> Result<(), Error>;
}

/// Keeps the raw stored string, like browser storage would.
#[derive(Debug, Default)]
pub struct MemoryViewModeStore {
    raw: Mutex<Option<String>>,
}

impl MemoryViewModeStore {
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }
}

#[async_trait]
impl ViewModeStore for MemoryViewModeStore {
    async fn load(&self) -> Option<ViewMode> {
        self.raw().as_deref().and_then(ViewMode::parse)
    }

    async fn save(&self, mode: ViewMode) -> Result<(), Error> {
        if let Ok(mut raw) = self.raw.lock() {
            *raw = Some(mode.as_str().to_string());
        }
        Ok(())
    }
}

/// The browser session of the notes page. Lives as long as the session cookie.
#[derive(Clone)]
pub struct SessionViewModeStore {
    session: Session,
}

impl SessionViewModeStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ViewModeStore for SessionViewModeStore {
    async fn load(&self) -> Option<ViewMode> {
        let raw = self
            .session
            .get::<String>(VIEW_MODE_KEY)
            .await
            .inspect_err(|error| tracing::warn!("unreadable view mode: {error}"))
            .ok()??;

        ViewMode::parse(&raw)
    }

    async fn save(&self, mode: ViewMode) -> Result<(), Error> {
        self.session.insert(VIEW_MODE_KEY, mode.as_str()).await?;
        Ok(())
    }
}

/// JSON object on disk, shared with other client settings. Only the `viewMode` key is touched.
#[derive(Debug, Clone)]
pub struct FileViewModeStore {
    path: PathBuf,
}

impl FileViewModeStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read(&self) -> Result<Map<String, Value>, Error> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(error.into()),
        };

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(settings) => Ok(settings),
            _ => Ok(Map::new()),
        }
    }
}

#[async_trait]
impl ViewModeStore for FileViewModeStore {
    async fn load(&self) -> Option<ViewMode> {
        let settings = self
            .read()
            .await
            .inspect_err(|error| tracing::warn!(path = %self.path.display(), "unreadable settings: {error}"))
            .ok()?;

        settings.get(VIEW_MODE_KEY)?.as_str().and_then(ViewMode::parse)
    }

    async fn save(&self, mode: ViewMode) -> Result<(), Error> {
        let mut settings = self.read().await.unwrap_or_default();
        settings.insert(VIEW_MODE_KEY.into(), Value::String(mode.as_str().into()));

        fs::write(&self.path, serde_json::to_string_pretty(&settings)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn memory_store_ignores_unknown_values() {
        assert_eq!(MemoryViewModeStore::default().load().await, None);
        assert_eq!(MemoryViewModeStore::with_raw("tiles").load().await, None);
        assert_eq!(MemoryViewModeStore::with_raw("list").load().await, Some(ViewMode::List));

        let store = MemoryViewModeStore::with_raw("tiles");
        store.save(ViewMode::Grid).await.unwrap();
        assert_eq!(store.raw().as_deref(), Some("grid"));
    }

    #[tokio::test]
    async fn session_store_round_trips() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let store = SessionViewModeStore::new(session.clone());
        assert_eq!(store.load().await, None);

        store.save(ViewMode::List).await.unwrap();

        assert_eq!(SessionViewModeStore::new(session.clone()).load().await, Some(ViewMode::List));
        assert_eq!(session.get::<String>(VIEW_MODE_KEY).await.unwrap().as_deref(), Some("list"));

        session.insert(VIEW_MODE_KEY, "tiles").await.unwrap();
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn file_store_round_trips_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = FileViewModeStore::new(&path);
        assert_eq!(store.load().await, None);

        store.save(ViewMode::List).await.unwrap();
        assert_eq!(store.load().await, Some(ViewMode::List));

        let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(settings["theme"], "dark");
        assert_eq!(settings[VIEW_MODE_KEY], "list");
    }

    #[tokio::test]
    async fn file_store_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileViewModeStore::new(&path);
        assert_eq!(store.load().await, None);

        store.save(ViewMode::Grid).await.unwrap();
        assert_eq!(store.load().await, Some(ViewMode::Grid));
    }

    #[tokio::test]
    async fn missing_file_and_unknown_value_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(FileViewModeStore::new(&path).load().await, None);

        std::fs::write(&path, r#"{"viewMode": "tiles"}"#).unwrap();
        assert_eq!(FileViewModeStore::new(&path).load().await, None);
    }
}
