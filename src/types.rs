//! Core data types for the billboard editor.
//!
//! This module defines the placed elements, the small geometry primitives shared by
//! the session, the renderer and the UI, and the billboard bounds rectangle.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for placed elements. Never reused within a session.
pub type ElementId = Uuid;

/// A point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Size {
    /// Creates a size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle from an origin point and a size.
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Centre point.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether `p` lies inside the rectangle (edges inclusive).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// On-screen rectangle of the billboard's editable face.
///
/// Derived from the displayed background geometry and recomputed whenever it changes.
/// Element positions live in the same absolute coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BillboardBounds {
    /// Left edge in viewport pixels
    pub left: f32,
    /// Top edge in viewport pixels
    pub top: f32,
    /// Right edge in viewport pixels
    pub right: f32,
    /// Bottom edge in viewport pixels
    pub bottom: f32,
}

impl BillboardBounds {
    /// Creates bounds from the four edges.
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Creates bounds covering `rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.right(), rect.bottom())
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// The bounds as a rectangle.
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width(), self.height())
    }
}

/// The kind of a placed element.
///
/// `Person` and `Logo` render identically (both are images); they differ only in
/// their creation defaults and the library bucket they come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A photo of a person
    Person,
    /// A styled text box
    Text,
    /// A brand logo
    Logo,
}

impl ElementKind {
    /// Whether the element is drawn from an image source.
    pub fn is_image(&self) -> bool {
        matches!(self, ElementKind::Person | ElementKind::Logo)
    }
}

/// Horizontal text alignment inside a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchor at the box's left edge
    Left,
    /// Anchor at the box's horizontal midpoint
    #[default]
    Center,
    /// Anchor at the box's right edge
    Right,
}

impl TextAlign {
    /// Parses a CSS `text-align` value; only `left`, `center` and `right` are recognised.
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            _ => None,
        }
    }

    /// The CSS keyword for this alignment.
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Corner handle grabbed during a resize. The opposite corner stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeCorner {
    /// Top-left handle (anchors bottom-right)
    TopLeft,
    /// Top-right handle (anchors bottom-left)
    TopRight,
    /// Bottom-left handle (anchors top-right)
    BottomLeft,
    /// Bottom-right handle (anchors top-left)
    BottomRight,
}

impl ResizeCorner {
    /// All four corners.
    pub const ALL: [ResizeCorner; 4] = [
        ResizeCorner::TopLeft,
        ResizeCorner::TopRight,
        ResizeCorner::BottomLeft,
        ResizeCorner::BottomRight,
    ];

    /// Position of this corner on `rect`.
    pub fn point_on(&self, rect: &Rect) -> Point {
        match self {
            ResizeCorner::TopLeft => Point::new(rect.x, rect.y),
            ResizeCorner::TopRight => Point::new(rect.right(), rect.y),
            ResizeCorner::BottomLeft => Point::new(rect.x, rect.bottom()),
            ResizeCorner::BottomRight => Point::new(rect.right(), rect.bottom()),
        }
    }
}

/// A placed object on the billboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier, stable for the element's lifetime
    pub id: ElementId,
    /// Variant discriminator
    pub kind: ElementKind,
    /// Top-left corner in viewport-absolute pixels
    pub position: Point,
    /// Box size in pixels
    pub size: Size,
    /// Image URL for image kinds; upper-cased plain text for text
    pub content: String,
    /// Rich markup for text elements
    pub styled_content: Option<String>,
    /// Font size mirrored from the markup, used as fallback
    pub font_size: Option<f32>,
}

impl Element {
    /// Creates an image element (person or logo) with a fresh identifier.
    pub fn image(kind: ElementKind, source: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size,
            content: source.into(),
            styled_content: None,
            font_size: None,
        }
    }

    /// Creates a text element with a fresh identifier.
    pub fn text(
        content: impl Into<String>,
        markup: impl Into<String>,
        font_size: f32,
        position: Point,
        size: Size,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ElementKind::Text,
            position,
            size,
            content: content.into(),
            styled_content: Some(markup.into()),
            font_size: Some(font_size),
        }
    }

    /// The element's box in viewport-absolute pixels.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}
