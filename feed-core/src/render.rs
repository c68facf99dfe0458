use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::post::PostRecord;
use crate::sanitize::{MarkupSanitizer, SafeElement, SafeFragment, SafeNode, SafeTag};

pub const DEFAULT_MAX_BODY_CHARS: usize = 200;
pub const ELLIPSIS: &str = "...";

/// Cuts `text` to `max_length` characters plus [`ELLIPSIS`] when it is longer.
pub fn truncate(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_owned(),
    }
}

impl SafeFragment {
    /// Keeps at most `max_length` visible characters. The cut happens inside
    /// the text node that crosses the limit, followed by [`ELLIPSIS`]; later
    /// nodes are dropped and open elements stay well-formed.
    pub fn truncated(&self, max_length: usize) -> SafeFragment {
        if self.text_len() <= max_length {
            return self.clone();
        }
        let mut budget = max_length;
        let mut nodes = Vec::new();
        truncate_nodes(&self.nodes, &mut budget, &mut nodes);
        SafeFragment { nodes }
    }

    /// Flattens the fragment into blocks of styled spans.
    pub fn blocks(&self) -> Vec<TextBlock> {
        let mut builder = BlockBuilder::default();
        builder.walk(&self.nodes, SpanStyle::default(), 0, None);
        builder.finish()
    }
}

// Returns true once the budget ran out and the ellipsis was placed.
fn truncate_nodes(nodes: &[SafeNode], budget: &mut usize, out: &mut Vec<SafeNode>) -> bool {
    for node in nodes {
        match node {
            SafeNode::Text(text) => {
                let len = text.chars().count();
                if len <= *budget {
                    *budget -= len;
                    if *budget == 0 && len > 0 {
                        // more text follows, so the marker belongs to this node
                        out.push(SafeNode::Text(format!("{text}{ELLIPSIS}")));
                        return true;
                    }
                    out.push(SafeNode::Text(text.clone()));
                } else {
                    out.push(SafeNode::Text(truncate(text, *budget)));
                    *budget = 0;
                    return true;
                }
            }
            SafeNode::Element(el) => {
                let mut copy = el.clone_shallow();
                let done = truncate_nodes(&el.children, budget, &mut copy.children);
                out.push(SafeNode::Element(copy));
                if done {
                    return true;
                }
            }
        }
    }
    false
}

impl SafeElement {
    fn clone_shallow(&self) -> SafeElement {
        SafeElement {
            tag: self.tag,
            href: self.href.clone(),
            target: self.target.clone(),
            rel: self.rel.clone(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub style: SpanStyle,
    pub link: Option<String>,
    pub new_tab: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Bullet,
    Number(usize),
}

/// One paragraph or list item, split into lines at `<br>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub indent: usize,
    pub marker: Option<Marker>,
    pub lines: Vec<Vec<TextSpan>>,
}

impl TextBlock {
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|span| span.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<TextBlock>,
    current: TextBlock,
    link: Option<(String, bool)>,
}

impl BlockBuilder {
    fn walk(&mut self, nodes: &[SafeNode], style: SpanStyle, depth: usize, list: Option<ListKind>) {
        let mut ordinal = 0;
        for node in nodes {
            match node {
                SafeNode::Text(text) => self.push_text(text, style),
                SafeNode::Element(el) => match el.tag {
                    SafeTag::B | SafeTag::Strong => {
                        self.walk(&el.children, SpanStyle { bold: true, ..style }, depth, None)
                    }
                    SafeTag::I | SafeTag::Em => {
                        self.walk(&el.children, SpanStyle { italic: true, ..style }, depth, None)
                    }
                    SafeTag::A => {
                        let outer = self.link.take();
                        self.link = el.href.clone().map(|href| {
                            let new_tab = el.target.as_deref() == Some("_blank");
                            (href, new_tab)
                        });
                        self.walk(&el.children, style, depth, None);
                        self.link = outer;
                    }
                    SafeTag::Br => {
                        if !self.current.lines.is_empty() {
                            self.current.lines.push(Vec::new());
                        }
                    }
                    SafeTag::P => {
                        self.break_block(depth);
                        self.walk(&el.children, style, depth, None);
                        self.break_block(depth);
                    }
                    SafeTag::Ul | SafeTag::Ol => {
                        let kind = if el.tag == SafeTag::Ol {
                            ListKind::Ordered
                        } else {
                            ListKind::Unordered
                        };
                        self.break_block(depth + 1);
                        self.walk(&el.children, style, depth + 1, Some(kind));
                        self.break_block(depth);
                        self.current.marker = None;
                    }
                    SafeTag::Li => {
                        ordinal += 1;
                        self.break_block(depth);
                        self.current.marker = Some(match list {
                            Some(ListKind::Ordered) => Marker::Number(ordinal),
                            _ => Marker::Bullet,
                        });
                        self.walk(&el.children, style, depth, None);
                        self.break_block(depth);
                    }
                },
            }
        }
    }

    fn push_text(&mut self, text: &str, style: SpanStyle) {
        let text = collapse_whitespace(text);
        let starts_line = self.current.lines.last().map_or(true, |line| line.is_empty());
        let text = if starts_line { text.trim_start().to_owned() } else { text };
        if text.is_empty() {
            return;
        }
        if self.current.lines.is_empty() {
            self.current.lines.push(Vec::new());
        }
        let (link, new_tab) = match &self.link {
            Some((href, new_tab)) => (Some(href.clone()), *new_tab),
            None => (None, false),
        };
        if let Some(line) = self.current.lines.last_mut() {
            match line.last_mut() {
                Some(last) if last.style == style && last.link == link => last.text.push_str(&text),
                _ => line.push(TextSpan {
                    text,
                    style,
                    link,
                    new_tab,
                }),
            }
        }
    }

    fn break_block(&mut self, depth: usize) {
        let mut block = std::mem::take(&mut self.current);
        for line in &mut block.lines {
            if let Some(last) = line.last_mut() {
                let trimmed = last.text.trim_end().len();
                last.text.truncate(trimmed);
            }
            line.retain(|span| !span.text.is_empty());
        }
        while block.lines.last().is_some_and(|line| line.is_empty()) {
            block.lines.pop();
        }
        if block.lines.is_empty() {
            // <li><p>..</p></li>: the marker belongs to the first real line.
            self.current.marker = block.marker;
        } else {
            self.blocks.push(block);
        }
        self.current.indent = depth;
    }

    fn finish(mut self) -> Vec<TextBlock> {
        let depth = self.current.indent;
        self.break_block(depth);
        self.blocks
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Display model of one post card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub external_url: String,
    pub author: Option<String>,
    pub num_comments: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub discussion_url: Option<String>,
    pub body: Option<SafeFragment>,
    pub truncated: bool,
}

/// Sanitizes the body first, then truncates on visible text.
pub fn render_post(post: &PostRecord, sanitizer: &MarkupSanitizer, config: &RenderConfig) -> PostCard {
    let sanitized = sanitizer.sanitize(&post.body_text);
    let (body, truncated) = match sanitized {
        Some(fragment) if fragment.text_len() > config.max_body_chars => {
            (Some(fragment.truncated(config.max_body_chars)), true)
        }
        other => (other, false),
    };

    PostCard {
        id: post.id.clone(),
        title: post.title.clone(),
        score: post.score,
        external_url: post.external_url.clone(),
        author: post.author.clone(),
        num_comments: post.num_comments,
        created_at: post.created_at,
        discussion_url: post.discussion_url(&config.link_base),
        body,
        truncated,
    }
}

/// Short relative age such as `5m ago` or `3d ago`.
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 365 {
        format!("{}d ago", elapsed.num_days())
    } else {
        format!("{}y ago", elapsed.num_days() / 365)
    }
}
