use std::fmt::Write as _;

use textwrap::{wrap, Options as WrapOptions};
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::deck::DeckIndexStore;
use crate::layout::{FeedSubject, TimelineCell, TimelineLayout};
use crate::post::{Category, Post, Reply, Timestamp};
use crate::thread::ThreadPaginator;
use crate::view::{resolve_card, Card, RiverHost};

const LABEL_WIDTH: usize = 14;
const CARD_INDENT: &str = "    | ";

/// Plain-text host used by the command line. Line width is chosen per
/// render call.
#[derive(Debug, Default)]
pub struct TextHost {
    events: Vec<String>,
}

impl TextHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }
}

impl RiverHost for TextHost {
    type Output = Vec<String>;

    fn render_post_actions(&self, _post: &Post, compact: bool) -> Vec<String> {
        let line = if compact {
            "[+] [reply]"
        } else {
            "[+ like] [reply] [share]"
        };
        vec![line.to_string()]
    }

    fn render_comment_section(&self, _post: &Post) -> Vec<String> {
        Vec::new()
    }

    fn format_date(&self, timestamp: Timestamp) -> String {
        match timestamp.to_datetime() {
            Some(when) if timestamp != Timestamp::EPOCH => when.format("%b %-d, %Y %H:%M").to_string(),
            _ => "unknown date".to_string(),
        }
    }

    fn navigate(&mut self, path: &str) {
        info!(path, "navigate");
        self.events.push(format!("navigate {path}"));
    }

    fn on_card_click(&mut self, post: &Post) {
        info!(post = %post.id, "card opened");
        self.events.push(format!("open {}", post.id));
    }

    fn expand_media(&mut self, post: &Post) {
        self.events.push(format!("expand {}", post.id));
    }
}

fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    let mut padded = text.to_string();
    padded.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    padded
}

fn label(category: Category, count: usize, recent: bool) -> String {
    let marker = if recent { " *" } else { "" };
    format!("{} {count}{marker}", category.display_name())
}

fn push_card<H>(out: &mut String, host: &H, width: usize, card: &Card<'_>, compact: bool)
where
    H: RiverHost<Output = Vec<String>>,
{
    let body_width = width.saturating_sub(CARD_INDENT.len()).max(10);
    let content = if card.post.content.trim().is_empty() {
        "(no text)"
    } else {
        card.post.content.as_str()
    };
    for line in wrap(content, WrapOptions::new(body_width)) {
        let _ = writeln!(out, "{CARD_INDENT}{line}");
    }
    if let Some(url) = card.post.media_url.as_deref() {
        let _ = writeln!(out, "{CARD_INDENT}<media {url}>");
    }
    let _ = writeln!(
        out,
        "{CARD_INDENT}{} . {}",
        host.format_date(card.post.created_at),
        card.position_label()
    );
    for line in host
        .render_post_actions(card.post, compact)
        .into_iter()
        .chain(host.render_comment_section(card.post))
    {
        let _ = writeln!(out, "{CARD_INDENT}{line}");
    }
}

pub fn render_feed<H>(subjects: &[FeedSubject<'_>], store: &DeckIndexStore, host: &H, width: usize) -> String
where
    H: RiverHost<Output = Vec<String>>,
{
    let mut out = String::new();
    for subject in subjects {
        let _ = writeln!(
            out,
            "== {} ({})  {}",
            subject.author.handle(),
            subject.author.avatar,
            subject.profile_path()
        );
        for row in &subject.rows {
            let labels: Vec<String> = row
                .columns
                .iter()
                .map(|column| pad(&label(column.category, column.posts.len(), column.recent), LABEL_WIDTH))
                .collect();
            let _ = writeln!(
                out,
                "-- row {} [{}-col] {}",
                row.index + 1,
                row.column_count(),
                labels.join("| ").trim_end()
            );
            for column in &row.columns {
                let Some(card) = resolve_card(store, &column.deck, column.posts) else {
                    continue;
                };
                let _ = writeln!(out, "  {}", column.category.display_name());
                push_card(&mut out, host, width, &card, true);
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_timeline<H>(layout: &TimelineLayout<'_>, store: &DeckIndexStore, host: &H, width: usize) -> String
where
    H: RiverHost<Output = Vec<String>>,
{
    let mut out = String::new();
    let labels: Vec<String> = layout
        .labels
        .iter()
        .map(|(_, l)| pad(&label(l.category, l.count, l.recent), LABEL_WIDTH))
        .collect();
    let _ = writeln!(out, "== {}  {}", layout.subject, labels.join("| ").trim_end());
    for row in &layout.rows {
        let _ = writeln!(out, "-- row {}", row.index + 1);
        for (category, column) in row.columns.iter() {
            let _ = writeln!(out, "  {}", category.display_name());
            match column.cell {
                TimelineCell::Posts(posts) => {
                    if let Some(card) = resolve_card(store, &column.deck, posts) {
                        push_card(&mut out, host, width, &card, false);
                    }
                }
                TimelineCell::Empty { message } => {
                    let _ = writeln!(out, "{CARD_INDENT}{}", message.unwrap_or(""));
                }
            }
        }
    }
    out
}

/// Reply list for one post, collapsed to the preview unless `show_all`.
pub fn render_thread(thread: &ThreadPaginator, replies: &[Reply], show_all: bool, width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== thread {}", thread.post_id());
    if let Some(empty) = ThreadPaginator::empty_label(replies) {
        let _ = writeln!(out, "{CARD_INDENT}{empty}");
        return out;
    }
    let body_width = width.saturating_sub(CARD_INDENT.len()).max(10);
    for reply in thread.visible_replies(replies, show_all) {
        let _ = writeln!(out, "  {}", reply.author_label());
        for line in wrap(reply.content.as_str(), WrapOptions::new(body_width)) {
            let _ = writeln!(out, "{CARD_INDENT}{line}");
        }
    }
    if let Some(toggle) = thread.toggle_label(replies, show_all) {
        let _ = writeln!(out, "  [{toggle}]");
    }
    out
}
