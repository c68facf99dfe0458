use chrono::{Duration, TimeZone, Utc};
use feed_core::render::DEFAULT_MAX_BODY_CHARS;
use feed_core::{
    format_age, render_post, sanitize_markup, truncate, Marker, MarkupSanitizer, PostRecord,
    RenderConfig, SafeNode, SafeTag, SpanStyle, TextSpan,
};

fn post_with_body(body: &str) -> PostRecord {
    PostRecord {
        id: "p1".into(),
        title: "A post".into(),
        body_text: body.into(),
        score: 42,
        external_url: "https://example.com/p1".into(),
        author: Some("bob".into()),
        num_comments: 7,
        created_at: None,
        permalink: Some("/r/reactjs/comments/p1/a_post/".into()),
    }
}

fn span(text: &str) -> TextSpan {
    TextSpan {
        text: text.into(),
        style: SpanStyle::default(),
        link: None,
        new_tab: false,
    }
}

#[test]
fn truncate_cuts_long_text_and_appends_ellipsis() {
    let long = "a".repeat(201);
    let cut = truncate(&long, 200);
    assert_eq!(cut, format!("{}...", "a".repeat(200)));
    assert_eq!(cut.chars().count(), 203);
}

#[test]
fn truncate_leaves_short_text_alone() {
    assert_eq!(truncate("short", 200), "short");
    let exact = "b".repeat(200);
    assert_eq!(truncate(&exact, 200), exact);
    assert_eq!(truncate("", 200), "");
}

#[test]
fn truncate_counts_characters_not_bytes() {
    let long = "é".repeat(201);
    assert_eq!(truncate(&long, 200), format!("{}...", "é".repeat(200)));
    assert_eq!(truncate("日本語", 2), "日本...");
}

#[test]
fn fragment_truncation_cuts_inside_the_crossing_text_node() {
    let html = format!("<p>{}</p><p>{}</p><p>dropped</p>", "a".repeat(150), "b".repeat(100));
    let fragment = sanitize_markup(&html).expect("content");
    assert_eq!(fragment.text_len(), 257);

    let cut = fragment.truncated(200);
    assert_eq!(cut.text(), format!("{}{}...", "a".repeat(150), "b".repeat(50)));
    assert_eq!(cut.nodes.len(), 2);
    assert!(cut.to_html().ends_with("...</p>"));
}

#[test]
fn fragment_truncation_never_splits_markup() {
    let html = format!(
        r#"<p>{} <a href="https://example.com/long">{}</a> tail</p>"#,
        "x".repeat(190),
        "y".repeat(40)
    );
    let fragment = sanitize_markup(&html).expect("content");
    let cut = fragment.truncated(200);
    let out = cut.to_html();
    assert!(out.starts_with("<p>"));
    assert!(out.ends_with("...</a></p>"));
    assert!(out.contains(r#"<a href="https://example.com/long">"#));
    assert_eq!(cut.text_len(), 203);
}

#[test]
fn short_fragments_are_not_truncated() {
    let fragment = sanitize_markup("<p>tiny</p>").expect("content");
    assert_eq!(fragment.truncated(200), fragment);
}

#[test]
fn formatting_whitespace_between_paragraphs_is_not_counted() {
    let html = format!("<p>{}</p>\n\n\n\n<p>{}</p>", "a".repeat(100), "b".repeat(98));
    let fragment = sanitize_markup(&html).expect("content");
    assert_eq!(fragment.text_len(), 198);

    let card = render_post(&post_with_body(&html), &MarkupSanitizer::default(), &RenderConfig::default());
    assert!(!card.truncated);
    let shown: usize = card
        .body
        .expect("body")
        .blocks()
        .iter()
        .map(|b| b.plain_text().chars().count())
        .sum();
    assert_eq!(shown, 198);
}

#[test]
fn list_formatting_whitespace_is_not_counted() {
    let html = "<ul>\n  <li>one</li>\n  <li>two</li>\n</ul>\n<p>after</p>";
    let fragment = sanitize_markup(html).expect("content");
    assert_eq!(fragment.text(), "onetwoafter");
}

#[test]
fn ellipsis_stays_with_the_text_that_fills_the_limit() {
    let html = format!("<p>{}<b>bold</b></p>", "a".repeat(10));
    let cut = sanitize_markup(&html).expect("content").truncated(10);
    assert_eq!(cut.to_html(), format!("<p>{}...</p>", "a".repeat(10)));

    let html = format!("<p>{}<br>next line</p>", "c".repeat(10));
    let cut = sanitize_markup(&html).expect("content").truncated(10);
    assert_eq!(cut.to_html(), format!("<p>{}...</p>", "c".repeat(10)));
    assert_eq!(cut.blocks().len(), 1);
    assert_eq!(cut.blocks()[0].lines.len(), 1);
}

#[test]
fn render_post_truncates_after_sanitizing() {
    let sanitizer = MarkupSanitizer::default();
    let config = RenderConfig::default();
    assert_eq!(config.max_body_chars, DEFAULT_MAX_BODY_CHARS);

    // the markup does not count towards the limit, only visible text does
    let body = format!("<b>{}</b>", "z".repeat(199));
    let card = render_post(&post_with_body(&body), &sanitizer, &config);
    assert!(!card.truncated);
    assert_eq!(card.body.as_ref().map(|b| b.text_len()), Some(199));

    let body = "w".repeat(250);
    let card = render_post(&post_with_body(&body), &sanitizer, &config);
    assert!(card.truncated);
    let text = card.body.expect("body").text();
    assert_eq!(text, format!("{}...", "w".repeat(200)));
}

#[test]
fn render_post_maps_card_fields() {
    let sanitizer = MarkupSanitizer::default();
    let card = render_post(&post_with_body("hello"), &sanitizer, &RenderConfig::default());
    assert_eq!(card.id, "p1");
    assert_eq!(card.title, "A post");
    assert_eq!(card.score, 42);
    assert_eq!(card.external_url, "https://example.com/p1");
    assert_eq!(card.author.as_deref(), Some("bob"));
    assert_eq!(card.num_comments, 7);
    assert_eq!(
        card.discussion_url.as_deref(),
        Some("https://www.reddit.com/r/reactjs/comments/p1/a_post/")
    );
    assert_eq!(card.body.map(|b| b.nodes), Some(vec![SafeNode::Text("hello".into())]));
}

#[test]
fn render_post_degrades_to_empty_body() {
    let sanitizer = MarkupSanitizer::default();
    let config = RenderConfig::default();
    for body in ["", "<script>alert(1)</script>", "<img src=x onerror=alert(1)>"] {
        let card = render_post(&post_with_body(body), &sanitizer, &config);
        assert_eq!(card.body, None, "body {body:?}");
        assert!(!card.truncated);
        assert_eq!(card.title, "A post");
    }
}

#[test]
fn blocks_flatten_paragraphs_styles_and_links() {
    let fragment = sanitize_markup(
        r#"<p>Hello <b>bold</b> and <a href="https://x.example/" target="_blank">link</a></p>"#,
    )
    .expect("content");
    let blocks = fragment.blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].indent, 0);
    assert_eq!(blocks[0].marker, None);
    assert_eq!(
        blocks[0].lines,
        vec![vec![
            span("Hello "),
            TextSpan {
                style: SpanStyle { bold: true, italic: false },
                ..span("bold")
            },
            span(" and "),
            TextSpan {
                link: Some("https://x.example/".into()),
                new_tab: true,
                ..span("link")
            },
        ]]
    );
}

#[test]
fn blocks_mark_list_items() {
    let fragment = sanitize_markup("<ul><li>one</li><li>two</li></ul><ol><li>first</li><li>second</li></ol>")
        .expect("content");
    let blocks = fragment.blocks();
    let summary: Vec<(usize, Option<Marker>, String)> = blocks
        .iter()
        .map(|b| (b.indent, b.marker.clone(), b.plain_text()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, Some(Marker::Bullet), "one".to_string()),
            (1, Some(Marker::Bullet), "two".to_string()),
            (1, Some(Marker::Number(1)), "first".to_string()),
            (1, Some(Marker::Number(2)), "second".to_string()),
        ]
    );
}

#[test]
fn blocks_split_lines_on_breaks_and_collapse_whitespace() {
    let fragment = sanitize_markup("<p>line   one<br>\n  line two</p>plain\n\ntext").expect("content");
    let blocks = fragment.blocks();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].plain_text(), "line one\nline two");
    assert_eq!(blocks[1].plain_text(), "plain text");
}

#[test]
fn blocks_keep_nested_list_depth() {
    let fragment = sanitize_markup("<ul><li>outer<ul><li>inner</li></ul></li></ul>").expect("content");
    let blocks = fragment.blocks();
    let summary: Vec<(usize, String)> = blocks.iter().map(|b| (b.indent, b.plain_text())).collect();
    assert_eq!(summary, vec![(1, "outer".to_string()), (2, "inner".to_string())]);
    assert!(fragment
        .nodes
        .iter()
        .all(|n| matches!(n, SafeNode::Element(el) if el.tag == SafeTag::Ul)));
}

#[test]
fn format_age_picks_the_largest_unit() {
    let now = Utc.with_ymd_and_hms(2024, 10, 21, 12, 0, 0).unwrap();
    assert_eq!(format_age(now - Duration::seconds(20), now), "just now");
    assert_eq!(format_age(now - Duration::minutes(5), now), "5m ago");
    assert_eq!(format_age(now - Duration::hours(3), now), "3h ago");
    assert_eq!(format_age(now - Duration::days(2), now), "2d ago");
    assert_eq!(format_age(now - Duration::days(800), now), "2y ago");
}
