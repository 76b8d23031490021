use std::fmt::Display;

use chrono::{DateTime, Utc};
use rusqlite::{
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
    ToSql,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;

pub type NoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub color: NoteColor,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNote {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub color: NoteColor,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNote {
    pub note_id: Option<NoteId>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub color: NoteColor,
}

/// Request body of the create and update endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: NoteColor,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindNotesResponse {
    pub results: Vec<Note>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteNoteResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorValue {
    pub light: &'static str,
    pub dark: &'static str,
}

/// Color tag of a note. Anything outside the table reads as [`NoteColor::Gray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoteColor {
    Blue,
    Teal,
    Green,
    Purple,
    Pink,
    Yellow,
    Orange,
    Red,
    #[default]
    Gray,
    Indigo,
}

impl NoteColor {
    pub const ALL: [NoteColor; 10] = [
        NoteColor::Blue,
        NoteColor::Teal,
        NoteColor::Green,
        NoteColor::Purple,
        NoteColor::Pink,
        NoteColor::Yellow,
        NoteColor::Orange,
        NoteColor::Red,
        NoteColor::Gray,
        NoteColor::Indigo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteColor::Blue => "blue",
            NoteColor::Teal => "teal",
            NoteColor::Green => "green",
            NoteColor::Purple => "purple",
            NoteColor::Pink => "pink",
            NoteColor::Yellow => "yellow",
            NoteColor::Orange => "orange",
            NoteColor::Red => "red",
            NoteColor::Gray => "gray",
            NoteColor::Indigo => "indigo",
        }
    }

    pub fn resolve(id: &str) -> Self {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(id))
            .unwrap_or_default()
    }

    pub fn palette(self) -> ColorValue {
        let (light, dark) = match self {
            NoteColor::Blue => ("#BBE0F4", "#05101E"),
            NoteColor::Teal => ("#B2F2E6", "#040F0F"),
            NoteColor::Green => ("#D9FBE1", "#040F0B"),
            NoteColor::Purple => ("#E0BBFF", "#0D031A"),
            NoteColor::Pink => ("#F8D0E1", "#150811"),
            NoteColor::Yellow => ("#FFF8B0", "#0D0A00"),
            NoteColor::Orange => ("#FFD6A5", "#180D00"),
            NoteColor::Red => ("#FFBABA", "#130505"),
            NoteColor::Gray => ("#E1E1E1", "#0A0A0A"),
            NoteColor::Indigo => ("#C5CAE9", "#060A1E"),
        };
        ColorValue { light, dark }
    }

    pub fn value(self, theme: Theme) -> &'static str {
        let palette = self.palette();
        match theme {
            Theme::Light => palette.light,
            Theme::Dark => palette.dark,
        }
    }
}

impl Display for NoteColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NoteColor {
    fn from(id: String) -> Self {
        Self::resolve(&id)
    }
}

impl From<NoteColor> for String {
    fn from(color: NoteColor) -> Self {
        color.as_str().to_string()
    }
}

impl FromSql for NoteColor {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(NoteColor::default()),
            value => value.as_str().map(NoteColor::resolve),
        }
    }
}

impl ToSql for NoteColor {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_color_has_light_and_dark_values() {
        for color in NoteColor::ALL {
            let palette = NoteColor::resolve(color.as_str()).palette();

            assert!(palette.light.starts_with('#'), "{color}");
            assert!(palette.dark.starts_with('#'), "{color}");
            assert_eq!(NoteColor::resolve(color.as_str()), color);
        }
    }

    #[test]
    fn unknown_color_falls_back_to_gray() {
        assert_eq!(NoteColor::resolve("chartreuse"), NoteColor::Gray);
        assert_eq!(NoteColor::resolve(""), NoteColor::Gray);
        assert_eq!(NoteColor::resolve("chartreuse").value(Theme::Light), "#E1E1E1");
        assert_eq!(NoteColor::resolve("chartreuse").value(Theme::Dark), "#0A0A0A");
    }

    #[test]
    fn color_serde_uses_ids() {
        let color: NoteColor = serde_json::from_str("\"Blue\"").unwrap();
        assert_eq!(color, NoteColor::Blue);

        let color: NoteColor = serde_json::from_str("\"mauve\"").unwrap();
        assert_eq!(color, NoteColor::Gray);

        assert_eq!(serde_json::to_string(&NoteColor::Indigo).unwrap(), "\"indigo\"");
    }

    #[test]
    fn missing_color_in_form_is_gray() {
        let form: NoteForm = serde_json::from_str(r#"{"title": "t", "description": "d"}"#).unwrap();
        assert_eq!(form.color, NoteColor::Gray);
    }
}
