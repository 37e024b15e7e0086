use std::path::Path;

use pulldown_cmark::{BlockQuoteKind, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::app::domain::features::FeatureFlags;
use crate::app::infrastructure::error::Result;

const KATEX_CSS: &str = "https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.css";
const MERMAID_JS: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

/// Rewrites the parsed markdown for features the plain renderer does not
/// know about. Implementations must leave disabled features untouched.
pub trait PostProcessor {
    fn process<'a>(&self, events: Vec<Event<'a>>, features: &FeatureFlags) -> Vec<Event<'a>>;

    /// Extra `<head>` content (stylesheets, scripts) for an exported document.
    fn head(&self, _features: &FeatureFlags) -> String {
        String::new()
    }
}

/// Renders PDFs from exported HTML. Supplied by the host when a print
/// backend exists.
pub trait PdfPrinter {
    fn print_to_pdf(&self, html: &str, dest: &Path) -> Result<()>;
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Parser options for `features`. `> [!KIND]` markers are only consumed by
/// the parser when callouts are on; otherwise they stay plain quote text.
pub fn markdown_options(features: &FeatureFlags) -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    if features.callouts {
        options.insert(Options::ENABLE_GFM);
    }
    options
}

pub fn render_markdown(content: &str, features: &FeatureFlags, post: &dyn PostProcessor) -> String {
    let events: Vec<Event> = Parser::new_ext(content, markdown_options(features)).collect();
    let events = post.process(events, features);
    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn callout_name(kind: BlockQuoteKind) -> &'static str {
    match kind {
        BlockQuoteKind::Note => "note",
        BlockQuoteKind::Tip => "tip",
        BlockQuoteKind::Important => "important",
        BlockQuoteKind::Warning => "warning",
        BlockQuoteKind::Caution => "caution",
    }
}

fn is_mermaid(lang: &str) -> bool {
    lang.split_whitespace().next() == Some("mermaid")
}

fn raw<'a>(html: String) -> Event<'a> {
    Event::Html(CowStr::from(html))
}

/// Mermaid fences, GitHub-style callouts and KaTeX assets.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPostProcessor;

impl PostProcessor for DefaultPostProcessor {
    fn process<'a>(&self, events: Vec<Event<'a>>, features: &FeatureFlags) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut in_mermaid = false;
        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref lang)))
                    if features.mermaid && is_mermaid(lang) =>
                {
                    in_mermaid = true;
                    out.push(raw("<div class=\"mermaid\">".to_string()));
                }
                Event::Text(text) if in_mermaid => out.push(raw(escape_html(&text))),
                Event::End(TagEnd::CodeBlock) if in_mermaid => {
                    in_mermaid = false;
                    out.push(raw("</div>\n".to_string()));
                }
                Event::Start(Tag::BlockQuote(Some(kind))) if features.callouts => {
                    let name = callout_name(kind);
                    let mut title = name.to_string();
                    title[..1].make_ascii_uppercase();
                    out.push(raw(format!(
                        "<div class=\"callout callout-{}\">\n<p class=\"callout-title\">{}</p>\n",
                        name, title
                    )));
                }
                Event::End(TagEnd::BlockQuote(Some(_))) if features.callouts => {
                    out.push(raw("</div>\n".to_string()));
                }
                other => out.push(other),
            }
        }
        out
    }

    fn head(&self, features: &FeatureFlags) -> String {
        let mut head = String::new();
        if features.katex {
            head.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", KATEX_CSS));
        }
        if features.mermaid {
            head.push_str(&format!("<script src=\"{}\"></script>\n", MERMAID_JS));
            head.push_str("<script>mermaid.initialize({ startOnLoad: true });</script>\n");
        }
        head
    }
}

/// Standalone HTML document for `content`.
pub fn export_html(
    content: &str,
    title: &str,
    features: &FeatureFlags,
    post: &dyn PostProcessor,
) -> String {
    let body = render_markdown(content, features, post);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}</head>\n<body>\n<article class=\"markdown-body\">\n{}</article>\n</body>\n</html>\n",
        escape_html(title),
        post.head(features),
        body
    )
}
