//! # Rich Text
//!
//! Statement text fields support a tiny inline vocabulary: color, bold and
//! links. Inside the crate that vocabulary is the [`Inline`] tree; markup
//! strings are only parsed at the input boundary by [`parse_markup`].
//!
//! Supported tags:
//!
//! ```text
//! <color rgb='RRGGBB'>...</color>
//! <b>...</b>   <strong>...</strong>
//! <link href='...'>...</link>
//! ```
//!
//! plus the entities `&amp; &lt; &gt; &quot; &apos;`. Any other tag is a
//! [`FolioError::Markup`] error rather than being dropped silently.

use crate::error::{FolioError, Result};
use crate::style::Color;

/// A node of inline rich text.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Plain(String),
    Colored { color: Color, children: Vec<Inline> },
    Bold(Vec<Inline>),
    Link { href: String, children: Vec<Inline> },
}

/// A run of text with fully resolved inline style.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub color: Option<Color>,
    pub href: Option<String>,
}

/// A sequence of inline nodes: the content of one text field or cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichText {
    pub inlines: Vec<Inline>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            inlines: vec![Inline::Plain(text)],
        }
    }

    pub fn new(inlines: Vec<Inline>) -> Self {
        Self { inlines }
    }

    /// Parse a markup string. See the module docs for the vocabulary.
    pub fn parse(markup: &str) -> Result<Self> {
        parse_markup(markup)
    }

    /// Wrap the whole text in a color.
    pub fn colored(self, color: Color) -> Self {
        if self.inlines.is_empty() {
            return self;
        }
        Self {
            inlines: vec![Inline::Colored {
                color,
                children: self.inlines,
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans().iter().all(|s| s.text.is_empty())
    }

    /// Flatten the tree into styled spans, in reading order.
    pub fn spans(&self) -> Vec<Span> {
        let mut out = Vec::new();
        flatten(&self.inlines, false, None, None, &mut out);
        out
    }

    /// The text with all styling dropped.
    pub fn plain_text(&self) -> String {
        self.spans().into_iter().map(|s| s.text).collect()
    }
}

fn flatten(
    inlines: &[Inline],
    bold: bool,
    color: Option<Color>,
    href: Option<&str>,
    out: &mut Vec<Span>,
) {
    for inline in inlines {
        match inline {
            Inline::Plain(text) => {
                if text.is_empty() {
                    continue;
                }
                out.push(Span {
                    text: text.clone(),
                    bold,
                    color,
                    href: href.map(str::to_string),
                });
            }
            Inline::Colored { color, children } => flatten(children, bold, Some(*color), href, out),
            Inline::Bold(children) => flatten(children, true, color, href, out),
            Inline::Link { href, children } => flatten(children, bold, color, Some(href), out),
        }
    }
}

/// An open element while parsing; children accumulate until its close tag.
struct Frame {
    tag: String,
    kind: FrameKind,
    children: Vec<Inline>,
}

enum FrameKind {
    Root,
    Color(Color),
    Bold,
    Link(String),
}

/// Parse inline markup into [`RichText`].
pub fn parse_markup(input: &str) -> Result<RichText> {
    let mut stack = vec![Frame {
        tag: String::new(),
        kind: FrameKind::Root,
        children: Vec::new(),
    }];
    let mut text = String::new();
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        let after = &rest[lt + 1..];
        let is_tag = after
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '/')
            .unwrap_or(false);
        if !is_tag {
            text.push_str(&decode_entities(&rest[..=lt]));
            rest = after;
            continue;
        }

        text.push_str(&decode_entities(&rest[..lt]));
        let gt = after
            .find('>')
            .ok_or_else(|| FolioError::Markup(format!("unterminated tag in '{}'", input)))?;
        let tag_body = after[..gt].trim();
        rest = &after[gt + 1..];

        if !text.is_empty() {
            push_child(&mut stack, Inline::Plain(std::mem::take(&mut text)));
        }

        if let Some(name) = tag_body.strip_prefix('/') {
            close_tag(&mut stack, name.trim())?;
        } else {
            stack.push(open_tag(tag_body)?);
        }
    }
    text.push_str(&decode_entities(rest));
    if !text.is_empty() {
        push_child(&mut stack, Inline::Plain(text));
    }

    if stack.len() > 1 {
        let unclosed = stack.last().map(|f| f.tag.clone()).unwrap_or_default();
        return Err(FolioError::Markup(format!("unclosed <{}> tag", unclosed)));
    }
    let root = stack.pop().map(|f| f.children).unwrap_or_default();
    Ok(RichText::new(root))
}

fn push_child(stack: &mut [Frame], inline: Inline) {
    if let Some(top) = stack.last_mut() {
        top.children.push(inline);
    }
}

fn open_tag(body: &str) -> Result<Frame> {
    let (name, attrs) = match body.find(char::is_whitespace) {
        Some(i) => (&body[..i], body[i..].trim()),
        None => (body, ""),
    };
    let kind = match name {
        "b" | "strong" => FrameKind::Bold,
        "color" => {
            let rgb = attribute(attrs, "rgb")
                .ok_or_else(|| FolioError::Markup("<color> requires an rgb attribute".into()))?;
            FrameKind::Color(Color::hex(&rgb)?)
        }
        "link" => {
            let href = attribute(attrs, "href")
                .ok_or_else(|| FolioError::Markup("<link> requires an href attribute".into()))?;
            FrameKind::Link(decode_entities(&href))
        }
        other => return Err(FolioError::Markup(format!("unsupported tag <{}>", other))),
    };
    Ok(Frame {
        tag: name.to_string(),
        kind,
        children: Vec::new(),
    })
}

fn close_tag(stack: &mut Vec<Frame>, name: &str) -> Result<()> {
    let matches = stack.len() > 1
        && stack
            .last()
            .map(|f| f.tag == name)
            .unwrap_or(false);
    if !matches {
        return Err(FolioError::Markup(format!("unexpected </{}>", name)));
    }
    let frame = match stack.pop() {
        Some(f) => f,
        None => return Err(FolioError::Markup(format!("unexpected </{}>", name))),
    };
    let inline = match frame.kind {
        FrameKind::Bold => Inline::Bold(frame.children),
        FrameKind::Color(color) => Inline::Colored {
            color,
            children: frame.children,
        },
        FrameKind::Link(href) => Inline::Link {
            href,
            children: frame.children,
        },
        FrameKind::Root => return Err(FolioError::Markup("unbalanced markup".into())),
    };
    push_child(stack, inline);
    Ok(())
}

/// Find `name='value'` or `name="value"` in an attribute list.
fn attribute(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        let quote = after.chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let close = after[1..].find(quote)?;
        let value = &after[1..1 + close];
        if key == name {
            return Some(value.to_string());
        }
        rest = &after[close + 2..];
    }
    None
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let entity = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"]
            .iter()
            .find(|e| after.starts_with(*e));
        match entity {
            Some(e) => {
                out.push(match *e {
                    "&amp;" => '&',
                    "&lt;" => '<',
                    "&gt;" => '>',
                    "&quot;" => '"',
                    _ => '\'',
                });
                rest = &after[e.len()..];
            }
            None => {
                // A bare ampersand is literal text ("AT&T").
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let rich = parse_markup("Acme Inc\n123 Main St").unwrap();
        assert_eq!(rich.inlines, vec![Inline::Plain("Acme Inc\n123 Main St".into())]);
    }

    #[test]
    fn test_nested_color_link_bold() {
        let rich = parse_markup(
            "Contact <color rgb='326d92'><link href='mailto:a@b.com'><b>a@b.com</b></link></color>.",
        )
        .unwrap();
        let spans = rich.spans();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].text, "Contact ");
        assert!(!spans[0].bold);
        assert_eq!(spans[1].text, "a@b.com");
        assert!(spans[1].bold);
        assert_eq!(spans[1].href.as_deref(), Some("mailto:a@b.com"));
        assert_eq!(spans[1].color, Some(Color::hex("326d92").unwrap()));
        assert_eq!(spans[2].text, ".");
        assert!(spans[2].href.is_none());
    }

    #[test]
    fn test_unsupported_tag_rejected() {
        let err = parse_markup("<i>slanted</i>").unwrap_err();
        assert!(matches!(err, FolioError::Markup(_)));
    }

    #[test]
    fn test_unbalanced_tags_rejected() {
        assert!(parse_markup("<b>open").is_err());
        assert!(parse_markup("close</b>").is_err());
        assert!(parse_markup("<b><color rgb='000000'>x</b></color>").is_err());
    }

    #[test]
    fn test_non_ascii_color_value_rejected() {
        let err = parse_markup("<color rgb='a\u{e9}bcd'>x</color>").unwrap_err();
        assert!(matches!(err, FolioError::Markup(_)));
    }

    #[test]
    fn test_color_requires_rgb() {
        assert!(parse_markup("<color>x</color>").is_err());
        assert!(parse_markup("<color rgb='nothex'>x</color>").is_err());
    }

    #[test]
    fn test_entities_and_literal_angle() {
        let rich = parse_markup("a &lt; b &amp; AT&T 1 < 2").unwrap();
        assert_eq!(rich.plain_text(), "a < b & AT&T 1 < 2");
    }

    #[test]
    fn test_double_quoted_attributes() {
        let rich = parse_markup("<link href=\"https://x.test/?a=1\">x</link>").unwrap();
        assert_eq!(rich.spans()[0].href.as_deref(), Some("https://x.test/?a=1"));
    }

    #[test]
    fn test_empty_input() {
        let rich = parse_markup("").unwrap();
        assert!(rich.is_empty());
        assert!(rich.inlines.is_empty());
    }
}
