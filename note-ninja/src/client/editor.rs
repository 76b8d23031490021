//! Note body editors.
//!
//! [`HtmlEditor`] keeps the body as a list of blocks (paragraphs, headings and list items)
//! made of marked text spans, and reads and writes the same HTML fragment the note cards
//! render. Commands act on the selected block.

use std::fmt::Write;

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::notes::card::has_safe_scheme;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").unwrap();
    static ref HREF: Regex = Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap();
}

const HISTORY_LIMIT: usize = 100;

/// A `<br>` inside span text.
const HARD_BREAK: char = '\n';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    Bold,
    Italic,
    BulletList,
    OrderedList,
    Link(String),
    Undo,
    Redo,
}

impl EditorCommand {
    /// Reads a toolbar button. `link` takes its target from `href`.
    pub fn parse(name: &str, href: &str) -> Option<Self> {
        match name {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "bullet-list" => Some(Self::BulletList),
            "ordered-list" => Some(Self::OrderedList),
            "link" => Some(Self::Link(href.to_string())),
            "undo" => Some(Self::Undo),
            "redo" => Some(Self::Redo),
            _ => None,
        }
    }
}

pub trait RichTextEditor: Send {
    /// The body as stored on the note.
    fn content(&self) -> String;

    fn set_content(&mut self, html: &str);

    fn clear(&mut self);

    /// `false` when the command is unsupported or had nothing to act on.
    fn toggle_command(&mut self, command: EditorCommand) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Paragraph,
    /// `h1` to `h6`.
    Heading(u8),
    BulletItem,
    OrderedItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub marks: Marks,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub spans: Vec<Span>,
}

impl Block {
    fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text.is_empty())
    }

    fn push(&mut self, text: &str, marks: Marks) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.marks == marks => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                marks,
            }),
        }
    }

    fn normalize(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        for span in spans {
            self.push(&span.text, span.marks);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HtmlEditor {
    blocks: Vec<Block>,
    selected: usize,
    undo: Vec<Vec<Block>>,
    redo: Vec<Vec<Block>>,
}

impl HtmlEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_block(&mut self, index: usize) -> bool {
        if index >= self.blocks.len() {
            return false;
        }
        self.selected = index;
        true
    }

    /// Appends plain text to the selected block, starting a paragraph in an empty document.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.checkpoint();

        if self.blocks.is_empty() {
            self.blocks.push(Block::default());
            self.selected = 0;
        }
        self.blocks[self.selected].push(text, Marks::default());
    }

    /// Starts a new paragraph after the selected block and selects it.
    pub fn new_block(&mut self, text: &str) {
        self.checkpoint();

        let mut block = Block::default();
        block.push(text, Marks::default());

        let at = if self.blocks.is_empty() { 0 } else { self.selected + 1 };
        self.blocks.insert(at, block);
        self.selected = at;
    }

    /// Takes a body edited outside the editor. The change is one undo step.
    pub fn update_content(&mut self, html: &str) -> bool {
        let blocks = parse(html);
        if blocks == self.blocks {
            return false;
        }

        self.checkpoint();
        self.restore(blocks);
        true
    }

    fn checkpoint(&mut self) {
        self.undo.push(self.blocks.clone());
        if self.undo.len() > HISTORY_LIMIT {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    fn restore(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.selected = self.selected.min(self.blocks.len().saturating_sub(1));
    }

    fn selected_block(&self) -> Option<&Block> {
        self.blocks.get(self.selected).filter(|block| !block.is_empty())
    }

    fn toggle_mark(&mut self, is_set: impl Fn(&Marks) -> bool, set: impl Fn(&mut Marks, bool)) -> bool {
        let Some(block) = self.selected_block() else {
            return false;
        };
        let on = !block.spans.iter().all(|span| is_set(&span.marks));

        self.checkpoint();
        let block = &mut self.blocks[self.selected];
        for span in &mut block.spans {
            set(&mut span.marks, on);
        }
        block.normalize();
        true
    }

    fn toggle_kind(&mut self, kind: BlockKind) -> bool {
        if self.blocks.get(self.selected).is_none() {
            return false;
        }

        self.checkpoint();
        let block = &mut self.blocks[self.selected];
        block.kind = if block.kind == kind { BlockKind::Paragraph } else { kind };
        true
    }

    fn toggle_link(&mut self, href: String) -> bool {
        let href = href.trim().to_string();
        if !has_safe_scheme(&href) {
            return false;
        }
        let Some(block) = self.selected_block() else {
            return false;
        };
        let linked = block.spans.iter().all(|span| span.marks.link.as_deref() == Some(href.as_str()));

        self.checkpoint();
        let block = &mut self.blocks[self.selected];
        for span in &mut block.spans {
            span.marks.link = (!linked).then(|| href.clone());
        }
        block.normalize();
        true
    }
}

impl RichTextEditor for HtmlEditor {
    fn content(&self) -> String {
        serialize(&self.blocks)
    }

    fn set_content(&mut self, html: &str) {
        self.blocks = parse(html);
        self.selected = 0;
        self.undo.clear();
        self.redo.clear();
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn toggle_command(&mut self, command: EditorCommand) -> bool {
        match command {
            EditorCommand::Bold => self.toggle_mark(|marks| marks.bold, |marks, on| marks.bold = on),
            EditorCommand::Italic => self.toggle_mark(|marks| marks.italic, |marks, on| marks.italic = on),
            EditorCommand::BulletList => self.toggle_kind(BlockKind::BulletItem),
            EditorCommand::OrderedList => self.toggle_kind(BlockKind::OrderedItem),
            EditorCommand::Link(href) => self.toggle_link(href),
            EditorCommand::Undo => match self.undo.pop() {
                Some(previous) => {
                    let current = std::mem::replace(&mut self.blocks, previous.clone());
                    self.redo.push(current);
                    self.restore(previous);
                    true
                }
                None => false,
            },
            EditorCommand::Redo => match self.redo.pop() {
                Some(next) => {
                    self.undo.push(self.blocks.clone());
                    self.restore(next);
                    true
                }
                None => false,
            },
        }
    }
}

fn serialize(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        if open_list.is_some() && open_list != Some(block.kind) {
            close_list(&mut out, open_list.take());
        }

        match block.kind {
            BlockKind::Paragraph => out.push_str("<p>"),
            BlockKind::Heading(level) => {
                let _ = write!(out, "<h{level}>");
            }
            kind => {
                if open_list.is_none() {
                    out.push_str(if kind == BlockKind::BulletItem { "<ul>" } else { "<ol>" });
                    open_list = Some(kind);
                }
                out.push_str("<li>");
            }
        }

        for span in &block.spans {
            push_span(&mut out, span);
        }

        match block.kind {
            BlockKind::Paragraph => out.push_str("</p>"),
            BlockKind::Heading(level) => {
                let _ = write!(out, "</h{level}>");
            }
            _ => out.push_str("</li>"),
        }
    }
    close_list(&mut out, open_list);

    out
}

fn close_list(out: &mut String, list: Option<BlockKind>) {
    match list {
        Some(BlockKind::BulletItem) => out.push_str("</ul>"),
        Some(BlockKind::OrderedItem) => out.push_str("</ol>"),
        _ => {}
    }
}

fn push_span(out: &mut String, span: &Span) {
    if let Some(href) = &span.marks.link {
        let _ = write!(out, r#"<a href="{}">"#, encode_double_quoted_attribute(href));
    }
    if span.marks.bold {
        out.push_str("<strong>");
    }
    if span.marks.italic {
        out.push_str("<em>");
    }

    for (i, line) in span.text.split(HARD_BREAK).enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        out.push_str(&encode_text(line));
    }

    if span.marks.italic {
        out.push_str("</em>");
    }
    if span.marks.bold {
        out.push_str("</strong>");
    }
    if span.marks.link.is_some() {
        out.push_str("</a>");
    }
}

#[derive(Default)]
struct Parser {
    blocks: Vec<Block>,
    current: Option<Block>,
    lists: Vec<BlockKind>,
    /// Inside `<li>`, where paragraphs only separate lines.
    in_item: bool,
    bold: usize,
    italic: usize,
    links: Vec<Option<String>>,
}

impl Parser {
    fn marks(&self) -> Marks {
        Marks {
            bold: self.bold > 0,
            italic: self.italic > 0,
            link: self.links.last().cloned().flatten(),
        }
    }

    fn open(&mut self, kind: BlockKind) {
        self.close();
        self.current = Some(Block { kind, spans: vec![] });
    }

    fn close(&mut self) {
        if let Some(mut block) = self.current.take() {
            trim_trailing_spaces(&mut block);
            self.blocks.push(block);
        }
    }

    fn text(&mut self, raw: &str) {
        let text = decode_html_entities(raw).replace(['\r', '\n'], " ");
        let blank = text.trim().is_empty();

        let skip = match &self.current {
            None => blank,
            Some(block) => blank && block.spans.is_empty(),
        };
        if skip {
            return;
        }

        let marks = self.marks();
        self.current.get_or_insert_with(Block::default).push(&text, marks);
    }

    fn hard_break(&mut self) {
        let marks = self.marks();
        self.current
            .get_or_insert_with(Block::default)
            .push(&HARD_BREAK.to_string(), marks);
    }

    /// A paragraph or heading inside a list item.
    fn item_line(&mut self, closing: bool) {
        let Some(block) = self.current.as_mut().filter(|block| !block.spans.is_empty()) else {
            return;
        };
        if !closing {
            trim_trailing_spaces(block);
            self.hard_break();
        }
    }

    fn tag(&mut self, closing: bool, name: &str, attributes: &str) {
        let heading = heading_level(name);
        if self.in_item && (heading.is_some() || matches!(name, "p" | "div")) {
            self.item_line(closing);
            return;
        }

        if let Some(level) = heading {
            if closing {
                self.close();
            } else {
                self.open(BlockKind::Heading(level));
            }
            return;
        }

        match (name, closing) {
            ("p" | "div", false) => self.open(BlockKind::Paragraph),
            ("p" | "div", true) => self.close(),
            ("li", false) => {
                self.open(self.lists.last().copied().unwrap_or(BlockKind::BulletItem));
                self.in_item = true;
            }
            ("li", true) => {
                self.close();
                self.in_item = false;
            }
            ("ul", false) => self.lists.push(BlockKind::BulletItem),
            ("ol", false) => self.lists.push(BlockKind::OrderedItem),
            ("ul", true) | ("ol", true) => {
                self.close();
                self.in_item = false;
                self.lists.pop();
            }
            ("strong" | "b", false) => self.bold += 1,
            ("strong" | "b", true) => self.bold = self.bold.saturating_sub(1),
            ("em" | "i", false) => self.italic += 1,
            ("em" | "i", true) => self.italic = self.italic.saturating_sub(1),
            ("a", false) => {
                let href = HREF
                    .captures(attributes)
                    .and_then(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
                    .map(|href| decode_html_entities(href.as_str()).trim().to_string())
                    .filter(|href| has_safe_scheme(href));
                self.links.push(href);
            }
            ("a", true) => {
                self.links.pop();
            }
            ("br", false) => self.hard_break(),
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.close();
        self.blocks.retain(|block| !block.spans.is_empty());
        self.blocks
    }
}

fn trim_trailing_spaces(block: &mut Block) {
    if let Some(last) = block.spans.last_mut() {
        let len = last.text.trim_end_matches(' ').len();
        last.text.truncate(len);
    }
    block.spans.retain(|span| !span.text.is_empty());
}

fn heading_level(name: &str) -> Option<u8> {
    name.strip_prefix('h')
        .and_then(|level| level.parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level))
}

fn parse(html: &str) -> Vec<Block> {
    let mut parser = Parser::default();
    let mut last = 0;

    for caps in TOKEN.captures_iter(html) {
        let Some(tag) = caps.get(0) else { continue };
        parser.text(&html[last..tag.start()]);
        last = tag.end();

        parser.tag(&caps[1] == "/", &caps[2].to_ascii_lowercase(), &caps[3]);
    }
    parser.text(&html[last..]);

    parser.finish()
}

/// Body kept as typed, for clients without rich-text support.
#[derive(Debug, Clone, Default)]
pub struct PlainTextEditor {
    text: String,
}

impl PlainTextEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

impl RichTextEditor for PlainTextEditor {
    fn content(&self) -> String {
        self.text.clone()
    }

    fn set_content(&mut self, html: &str) {
        self.text = html.to_string();
    }

    fn clear(&mut self) {
        self.text.clear();
    }

    fn toggle_command(&mut self, _command: EditorCommand) -> bool {
        false
    }
}
