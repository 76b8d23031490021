use std::fmt::Write;

use chrono::{DateTime, Utc};
use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::{Note, NoteColor, NoteId, Theme};

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").unwrap();
    static ref HREF: Regex = Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap();
    static ref BARE_URL: Regex = Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<]+").unwrap();
}

const FORMATTING_TAGS: [&str; 8] = ["p", "strong", "b", "em", "i", "ul", "ol", "li"];

/// Everything a note card template needs, already resolved.
#[derive(Debug, Clone, Serialize)]
pub struct NoteCard {
    pub id: NoteId,
    pub title: String,
    /// Sanitized markup, safe to emit unescaped.
    pub body: String,
    pub date: String,
    pub color: NoteColor,
    pub background: &'static str,
}

impl NoteCard {
    pub fn new(note: &Note, theme: Theme) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            body: render_body(&note.description),
            date: format_date(&note.created_at),
            color: note.color,
            background: note.color.value(theme),
        }
    }
}

/// `Oct 19, 2026`
pub fn format_date(created_at: &DateTime<Utc>) -> String {
    created_at.format("%b %-d, %Y").to_string()
}

/// Renders a note body as markup that can only format text.
///
/// Text is escaped. Formatting tags are re-emitted without attributes, anchors keep
/// an `http`, `https` or `mailto` href and open in a new tab, every other tag is
/// dropped. Bare URLs outside anchors become links.
pub fn render_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut open_anchors = 0usize;
    let mut last = 0;

    for caps in TAG.captures_iter(body) {
        let Some(tag) = caps.get(0) else { continue };
        push_text(&mut out, &body[last..tag.start()], open_anchors > 0);
        last = tag.end();

        let closing = &caps[1] == "/";
        let name = caps[2].to_ascii_lowercase();

        match name.as_str() {
            name if FORMATTING_TAGS.contains(&name) => {
                out.push('<');
                if closing {
                    out.push('/');
                }
                out.push_str(name);
                out.push('>');
            }
            "br" if !closing => out.push_str("<br>"),
            "a" if closing => {
                if open_anchors > 0 {
                    open_anchors -= 1;
                    out.push_str("</a>");
                }
            }
            "a" => {
                if let Some(href) = safe_href(&caps[3]) {
                    open_anchors += 1;
                    push_anchor_open(&mut out, &href);
                }
            }
            _ => {}
        }
    }

    push_text(&mut out, &body[last..], open_anchors > 0);
    for _ in 0..open_anchors {
        out.push_str("</a>");
    }

    out
}

fn safe_href(attributes: &str) -> Option<String> {
    let caps = HREF.captures(attributes)?;
    let raw = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?.as_str();
    let href = decode_html_entities(raw).trim().to_string();

    has_safe_scheme(&href).then_some(href)
}

/// `http`, `https` and `mailto` targets only.
pub fn has_safe_scheme(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn push_anchor_open(out: &mut String, href: &str) {
    let _ = write!(
        out,
        r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
        encode_double_quoted_attribute(href)
    );
}

fn push_text(out: &mut String, text: &str, in_anchor: bool) {
    if text.is_empty() {
        return;
    }

    let text = decode_html_entities(text);
    if in_anchor {
        out.push_str(&encode_text(&text));
        return;
    }

    let mut last = 0;
    for url in BARE_URL.find_iter(&text) {
        out.push_str(&encode_text(&text[last..url.start()]));

        let href = if url.as_str().to_ascii_lowercase().starts_with("www.") {
            format!("https://{}", url.as_str())
        } else {
            url.as_str().to_string()
        };
        push_anchor_open(out, &href);
        out.push_str(&encode_text(url.as_str()));
        out.push_str("</a>");

        last = url.end();
    }
    out.push_str(&encode_text(&text[last..]));
}
