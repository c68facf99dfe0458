//! Untrusted markup to display nodes.
//!
//! Post bodies come straight from the feed and may carry arbitrary HTML. They
//! are cleaned with `ammonia` against a fixed allow-list, then the clean
//! output is re-parsed with `scraper` into [`SafeNode`] trees that the
//! renderer can walk without ever touching raw markup again.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use ammonia::{Builder, UrlRelative};
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

pub const ALLOWED_TAGS: [&str; 10] = ["p", "b", "i", "em", "strong", "a", "ul", "ol", "li", "br"];
pub const ALLOWED_ATTRIBUTES: [&str; 3] = ["href", "target", "rel"];
pub const ALLOWED_URL_SCHEMES: [&str; 3] = ["http", "https", "mailto"];
pub const DEFAULT_LINK_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeTag {
    P,
    B,
    I,
    Em,
    Strong,
    A,
    Ul,
    Ol,
    Li,
    Br,
}

impl SafeTag {
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name {
            "p" => SafeTag::P,
            "b" => SafeTag::B,
            "i" => SafeTag::I,
            "em" => SafeTag::Em,
            "strong" => SafeTag::Strong,
            "a" => SafeTag::A,
            "ul" => SafeTag::Ul,
            "ol" => SafeTag::Ol,
            "li" => SafeTag::Li,
            "br" => SafeTag::Br,
            _ => return None,
        };
        Some(tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            SafeTag::P => "p",
            SafeTag::B => "b",
            SafeTag::I => "i",
            SafeTag::Em => "em",
            SafeTag::Strong => "strong",
            SafeTag::A => "a",
            SafeTag::Ul => "ul",
            SafeTag::Ol => "ol",
            SafeTag::Li => "li",
            SafeTag::Br => "br",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeElement {
    pub tag: SafeTag,
    pub href: Option<String>,
    pub target: Option<String>,
    pub rel: Option<String>,
    pub children: Vec<SafeNode>,
}

impl SafeElement {
    pub fn new(tag: SafeTag) -> Self {
        Self {
            tag,
            href: None,
            target: None,
            rel: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SafeNode {
    Text(String),
    Element(SafeElement),
}

/// Sanitized body of a post: a forest of allow-listed nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeFragment {
    pub nodes: Vec<SafeNode>,
}

impl SafeFragment {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visible text, in document order.
    pub fn text(&self) -> String {
        fn walk(nodes: &[SafeNode], out: &mut String) {
            for node in nodes {
                match node {
                    SafeNode::Text(text) => out.push_str(text),
                    SafeNode::Element(el) => walk(&el.children, out),
                }
            }
        }
        let mut out = String::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Number of visible characters.
    pub fn text_len(&self) -> usize {
        fn walk(nodes: &[SafeNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    SafeNode::Text(text) => text.chars().count(),
                    SafeNode::Element(el) => walk(&el.children),
                })
                .sum()
        }
        walk(&self.nodes)
    }

    /// Re-serializes the fragment. Only allow-listed markup can come out.
    pub fn to_html(&self) -> String {
        fn escape(text: &str, out: &mut String) {
            for c in text.chars() {
                match c {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '"' => out.push_str("&quot;"),
                    _ => out.push(c),
                }
            }
        }
        fn walk(nodes: &[SafeNode], out: &mut String) {
            for node in nodes {
                match node {
                    SafeNode::Text(text) => escape(text, out),
                    SafeNode::Element(el) => {
                        out.push('<');
                        out.push_str(el.tag.name());
                        for (name, value) in [("href", &el.href), ("target", &el.target), ("rel", &el.rel)] {
                            if let Some(value) = value {
                                out.push(' ');
                                out.push_str(name);
                                out.push_str("=\"");
                                escape(value, out);
                                out.push('"');
                            }
                        }
                        out.push('>');
                        if el.tag != SafeTag::Br {
                            walk(&el.children, out);
                            out.push_str("</");
                            out.push_str(el.tag.name());
                            out.push('>');
                        }
                    }
                }
            }
        }
        let mut out = String::new();
        walk(&self.nodes, &mut out);
        out
    }
}

pub struct MarkupSanitizer {
    builder: Builder<'static>,
}

impl MarkupSanitizer {
    /// `link_base` resolves relative links; without it they are dropped.
    pub fn new(link_base: Option<Url>) -> Self {
        let mut builder = Builder::default();
        builder
            .tags(ALLOWED_TAGS.iter().copied().collect())
            .tag_attributes(HashMap::new())
            .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect())
            .clean_content_tags(["script", "style"].into_iter().collect::<HashSet<_>>())
            .url_schemes(ALLOWED_URL_SCHEMES.iter().copied().collect())
            .link_rel(None)
            .strip_comments(true);
        match link_base {
            Some(base) => builder.url_relative(UrlRelative::RewriteWithBase(base)),
            None => builder.url_relative(UrlRelative::Deny),
        };
        Self { builder }
    }

    /// Cleans `html` and parses the result into display nodes.
    ///
    /// Returns `None` for empty input, for markup with no visible text left,
    /// and when anything goes wrong internally. Never panics.
    pub fn sanitize(&self, html: &str) -> Option<SafeFragment> {
        if html.is_empty() {
            return None;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let clean = self.builder.clean(html).to_string();
            parse_clean_markup(&clean)
        }));

        match outcome {
            Ok(Ok(fragment)) if fragment.text().trim().is_empty() => None,
            Ok(Ok(fragment)) => Some(fragment),
            Ok(Err(unexpected)) => {
                warn!(tag = %unexpected, "sanitized markup contained an unexpected tag");
                None
            }
            Err(_) => {
                warn!("markup sanitizer panicked, dropping body");
                None
            }
        }
    }
}

impl Default for MarkupSanitizer {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_LINK_BASE).ok())
    }
}

/// Sanitizes with the default allow-list and link base.
pub fn sanitize_markup(html: &str) -> Option<SafeFragment> {
    static DEFAULT: OnceLock<MarkupSanitizer> = OnceLock::new();
    DEFAULT.get_or_init(MarkupSanitizer::default).sanitize(html)
}

fn parse_clean_markup(clean: &str) -> Result<SafeFragment, String> {
    let document = Html::parse_fragment(clean);
    let mut nodes = Vec::new();
    collect_children(document.root_element(), false, &mut nodes)?;
    Ok(SafeFragment { nodes })
}

fn collect_children(parent: ElementRef<'_>, in_list: bool, out: &mut Vec<SafeNode>) -> Result<(), String> {
    for child in parent.children() {
        if let Some(element) = ElementRef::wrap(child) {
            let value = element.value();
            let tag = SafeTag::from_name(value.name()).ok_or_else(|| value.name().to_owned())?;
            let mut safe = SafeElement::new(tag);
            safe.href = value.attr("href").map(str::to_owned);
            safe.target = value.attr("target").map(str::to_owned);
            safe.rel = value.attr("rel").map(str::to_owned);
            let list = matches!(tag, SafeTag::Ul | SafeTag::Ol);
            collect_children(element, list, &mut safe.children)?;
            out.push(SafeNode::Element(safe));
        } else if let Node::Text(text) = child.value() {
            let text: &str = text;
            match out.last_mut() {
                Some(SafeNode::Text(prev)) => prev.push_str(text),
                _ => out.push(SafeNode::Text(text.to_owned())),
            }
        }
    }
    drop_block_whitespace(out, in_list);
    Ok(())
}

// Whitespace between block elements is source formatting, never displayed.
fn drop_block_whitespace(nodes: &mut Vec<SafeNode>, in_list: bool) {
    let is_block = |node: &SafeNode| {
        matches!(
            node,
            SafeNode::Element(el) if matches!(el.tag, SafeTag::P | SafeTag::Ul | SafeTag::Ol | SafeTag::Li)
        )
    };
    let keep: Vec<bool> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| match node {
            SafeNode::Text(text) if text.chars().all(|c| c.is_ascii_whitespace()) => {
                !(in_list
                    || (i > 0 && is_block(&nodes[i - 1]))
                    || nodes.get(i + 1).is_some_and(is_block))
            }
            _ => true,
        })
        .collect();
    let mut keep = keep.into_iter();
    nodes.retain(|_| keep.next().unwrap_or(true));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_tags_after_cleaning_are_errors() {
        assert_eq!(parse_clean_markup("<p>ok</p><div>nope</div>"), Err("div".to_string()));
        assert_eq!(parse_clean_markup("<ul><li><img src=x></li></ul>"), Err("img".to_string()));
    }

    #[test]
    fn clean_markup_parses_into_nodes() {
        let fragment = parse_clean_markup("<p>a</p>\n\n<p>b</p>").unwrap();
        assert_eq!(fragment.nodes.len(), 2);
        assert_eq!(fragment.text(), "ab");
    }

    #[test]
    fn empty_clean_output_is_no_content() {
        let sanitizer = MarkupSanitizer::default();
        assert_eq!(sanitizer.sanitize("<script>x</script>\n\n<style>p{}</style>"), None);
        assert_eq!(sanitizer.sanitize("   "), None);
    }
}
