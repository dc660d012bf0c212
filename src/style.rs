//! Text style extraction from rich-text markup.
//!
//! The text widget emits a small HTML dialect: paragraphs (`<p>`, optionally headings)
//! containing `<span>`s, with inline `style` declarations for `font-family`,
//! `font-size`, `text-align`, `font-weight` and `font-style`, and `<strong>`/`<b>`,
//! `<em>`/`<i>` emphasis elements. This module parses that dialect into a
//! [`TextStyle`] and writes it back out for the built-in editor.

use crate::constants;
use crate::types::{Element, TextAlign};
use scraper::{ElementRef, Html, Node, Selector};
use std::fmt::Write as _;
use std::sync::LazyLock;

static STYLED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[style]").expect("static selector"));
static BOLD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, b").expect("static selector"));
static ITALIC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("em, i").expect("static selector"));
static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, h1, h2, h3, h4, h5, h6").expect("static selector"));

/// A font family after normalization to the families the app ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontFamily {
    /// Oswald (only the medium weight is bundled)
    Oswald,
    /// Playfair Display
    PlayfairDisplay,
    /// Any other family, used verbatim
    Other(String),
}

impl FontFamily {
    /// Maps a declared family name onto a bundled family where possible.
    ///
    /// Only the first entry of a comma-separated list is considered; quotes are dropped.
    pub fn normalize(raw: &str) -> Self {
        let first = raw
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .replace(['"', '\''], "");
        let lower = first.to_lowercase();
        if lower.contains("playfair") {
            FontFamily::PlayfairDisplay
        } else if lower.contains("oswald") {
            FontFamily::Oswald
        } else if first.is_empty() {
            FontFamily::default()
        } else {
            FontFamily::Other(first)
        }
    }

    /// The family name.
    pub fn name(&self) -> &str {
        match self {
            FontFamily::Oswald => "Oswald",
            FontFamily::PlayfairDisplay => "Playfair Display",
            FontFamily::Other(name) => name,
        }
    }

    /// The family name, quoted when it contains a space.
    pub fn quoted(&self) -> String {
        let name = self.name();
        if name.contains(' ') {
            format!("\"{name}\"")
        } else {
            name.to_string()
        }
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        FontFamily::Other(constants::DEFAULT_FONT_FAMILY.to_string())
    }
}

/// Resolved font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    /// 400
    Normal,
    /// 500
    Medium,
    /// 700
    Bold,
}

impl FontWeight {
    /// CSS keyword or number.
    pub fn as_css(&self) -> &'static str {
        match self {
            FontWeight::Normal => "normal",
            FontWeight::Medium => "500",
            FontWeight::Bold => "bold",
        }
    }
}

/// Everything needed to select a face and size for one text run.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Normalized family
    pub family: FontFamily,
    /// Resolved weight
    pub weight: FontWeight,
    /// Italic style
    pub italic: bool,
    /// Size in pixels
    pub size_px: f32,
}

impl FontSpec {
    /// Family list with the terminal fallbacks, e.g. `"Playfair Display", Arial, sans-serif`.
    pub fn family_list(&self) -> String {
        format!("{}, {}", self.family.quoted(), constants::FALLBACK_FONT_FAMILIES)
    }

    /// CSS `font` shorthand: style, weight, size and family list.
    pub fn shorthand(&self) -> String {
        format!(
            "{} {} {}px {}",
            if self.italic { "italic" } else { "normal" },
            self.weight.as_css(),
            self.size_px,
            self.family_list()
        )
    }
}

/// Plain style record extracted from markup.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Normalized family
    pub font_family: FontFamily,
    /// Size in on-screen pixels
    pub font_size_px: f32,
    /// Horizontal alignment
    pub text_align: TextAlign,
    /// Bold marker or weight present
    pub bold: bool,
    /// Italic marker or style present
    pub italic: bool,
    /// Upper-cased lines, never empty
    pub lines: Vec<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: FontFamily::default(),
            font_size_px: constants::DEFAULT_FONT_SIZE,
            text_align: TextAlign::default(),
            bold: false,
            italic: false,
            lines: Vec::new(),
        }
    }
}

/// Splits an inline `style` attribute into lower-cased property names and values.
fn declarations(style: &str) -> impl Iterator<Item = (String, &str)> {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        Some((name.trim().to_ascii_lowercase(), value.trim()))
    })
}

fn parse_px(value: &str) -> Option<f32> {
    let number = value.trim().strip_suffix("px")?.trim();
    number.parse::<f32>().ok().filter(|v| *v > 0.0)
}

fn is_bold_weight(value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "bold" | "bolder" => true,
        other => other.parse::<u16>().map(|w| w >= 600).unwrap_or(false),
    }
}

fn is_italic_style(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "italic" | "oblique")
}

/// Text of a subtree, with `<br>` turned into newlines.
fn text_with_breaks(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Plain-text content of a markup fragment, as a browser's `textContent` would report it.
pub fn plain_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    fragment.root_element().text().collect()
}

impl TextStyle {
    /// Parses `markup` into a style record.
    ///
    /// # Arguments
    ///
    /// * `markup` - Rich-text fragment from the text widget
    /// * `fallback_font_size` - The element's stored font size, used when no `px` size is declared
    /// * `fallback_text` - Plain content used when the markup yields no lines
    pub fn extract(markup: &str, fallback_font_size: Option<f32>, fallback_text: &str) -> Self {
        let fragment = Html::parse_fragment(markup);

        let mut family: Option<FontFamily> = None;
        let mut size: Option<f32> = None;
        let mut align: Option<TextAlign> = None;
        let mut bold = fragment.select(&BOLD).next().is_some();
        let mut italic = fragment.select(&ITALIC).next().is_some();

        for element in fragment.select(&STYLED) {
            let Some(style) = element.value().attr("style") else {
                continue;
            };
            for (name, value) in declarations(style) {
                match name.as_str() {
                    "font-family" if family.is_none() => family = Some(FontFamily::normalize(value)),
                    "font-size" if size.is_none() => size = parse_px(value),
                    "text-align" if align.is_none() => align = TextAlign::from_css(value),
                    "font-weight" => bold |= is_bold_weight(value),
                    "font-style" => italic |= is_italic_style(value),
                    _ => {}
                }
            }
        }

        let mut blocks = fragment.select(&BLOCKS).peekable();
        let mut lines: Vec<String> = if blocks.peek().is_some() {
            blocks
                .map(|block| block.text().collect::<String>().trim().to_uppercase())
                .filter(|line| !line.is_empty())
                .collect()
        } else {
            text_with_breaks(fragment.root_element())
                .to_uppercase()
                .split('\n')
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        };
        if lines.is_empty() {
            lines.push(fallback_text.to_uppercase());
        }

        Self {
            font_family: family.unwrap_or_default(),
            font_size_px: size
                .or(fallback_font_size)
                .unwrap_or(constants::DEFAULT_FONT_SIZE),
            text_align: align.unwrap_or_default(),
            bold,
            italic,
            lines,
        }
    }

    /// Extracts the style of a text element, falling back to its plain content.
    pub fn from_element(element: &Element) -> Self {
        let markup = element.styled_content.as_deref().unwrap_or(&element.content);
        Self::extract(markup, element.font_size, &element.content)
    }

    /// Weight used for rendering. Oswald is always medium: only that weight is bundled.
    pub fn font_weight(&self) -> FontWeight {
        if self.font_family == FontFamily::Oswald {
            FontWeight::Medium
        } else if self.bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        }
    }

    /// The font for this style at `size_px` (already mapped to the target space).
    pub fn font(&self, size_px: f32) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            weight: self.font_weight(),
            italic: self.italic,
            size_px,
        }
    }

    /// Writes the style back as widget markup, one paragraph per line.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        let lines: Vec<&str> = if self.lines.is_empty() {
            vec![""]
        } else {
            self.lines.iter().map(String::as_str).collect()
        };
        for line in lines {
            let _ = write!(
                out,
                "<p style=\"text-align: {}\"><span style=\"font-family: {}; font-size: {}px\">",
                self.text_align.as_css(),
                self.font_family.name(),
                self.font_size_px
            );
            if self.bold {
                out.push_str("<strong>");
            }
            if self.italic {
                out.push_str("<em>");
            }
            out.push_str(&escape_html(line));
            if self.italic {
                out.push_str("</em>");
            }
            if self.bold {
                out.push_str("</strong>");
            }
            out.push_str("</span></p>");
        }
        out
    }
}

fn escape_html(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            _ => s.push(ch),
        }
    }
    s
}
