//! Composite rendering of a billboard scene into a display list.
//!
//! Drawing order: background stretched over the whole canvas, then (inside the face
//! clip) every element in collection order, then the gradient overlay across the
//! editable area, then the clip is released.

use crate::assets::DecodedImage;
use crate::clip::ClipPath;
use crate::constants;
use crate::display_list::{DisplayList, DrawOp, GradientStop};
use crate::error::CanvasError;
use crate::geometry::{contain_fit, editable_area, GeometryMapper};
use crate::style::{FontSpec, TextStyle};
use crate::types::{BillboardBounds, Element, Rect, Size, TextAlign};
use std::sync::Arc;

/// One line of text positioned in target space.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Upper-cased text
    pub text: String,
    /// Anchor x (left edge, midpoint or right edge depending on alignment)
    pub x: f32,
    /// Vertical middle of the line
    pub y: f32,
}

/// Text lines laid out inside a box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Lines top to bottom
    pub lines: Vec<PlacedLine>,
    /// Horizontal anchor shared by every line
    pub anchor: TextAlign,
    /// Face and scaled size
    pub font: FontSpec,
    /// Distance between consecutive line middles
    pub line_height: f32,
}

/// Lays out `style` inside `rect`, scaling the font by `scale_ratio`.
///
/// Lines are centred vertically as a block; each line's `y` is its vertical middle.
pub fn layout_text(style: &TextStyle, rect: Rect, scale_ratio: f32) -> TextLayout {
    let font_size = style.font_size_px * scale_ratio;
    let line_height = font_size * constants::LINE_HEIGHT_FACTOR;
    let total = style.lines.len() as f32 * line_height;
    let start_y = rect.y + (rect.height - total) / 2.0 + line_height / 2.0;
    let x = match style.text_align {
        TextAlign::Left => rect.x,
        TextAlign::Right => rect.right(),
        TextAlign::Center => rect.x + rect.width / 2.0,
    };
    let lines = style
        .lines
        .iter()
        .enumerate()
        .map(|(i, text)| PlacedLine {
            text: text.clone(),
            x,
            y: start_y + i as f32 * line_height,
        })
        .collect();
    TextLayout {
        lines,
        anchor: style.text_align,
        font: style.font(font_size),
        line_height,
    }
}

/// The fixed overlay gradient stops.
pub fn overlay_gradient() -> Vec<GradientStop> {
    constants::OVERLAY_GRADIENT
        .iter()
        .map(|&(offset, rgb, alpha)| GradientStop { offset, rgb, alpha })
        .collect()
}

/// Overlay colour at `t` (0 top, 1 bottom) as unpremultiplied RGBA.
pub fn sample_overlay(t: f32) -> [u8; 4] {
    let stops = constants::OVERLAY_GRADIENT;
    let t = t.clamp(0.0, 1.0);
    let mut lower = stops[0];
    let mut upper = stops[stops.len() - 1];
    for pair in stops.windows(2) {
        if t >= pair[0].0 && t <= pair[1].0 {
            lower = pair[0];
            upper = pair[1];
            break;
        }
    }
    let span = upper.0 - lower.0;
    let f = if span > 0.0 { (t - lower.0) / span } else { 0.0 };
    let lerp = |a: f32, b: f32| a + (b - a) * f;
    [
        lerp(lower.1[0] as f32, upper.1[0] as f32).round() as u8,
        lerp(lower.1[1] as f32, upper.1[1] as f32).round() as u8,
        lerp(lower.1[2] as f32, upper.1[2] as f32).round() as u8,
        (lerp(lower.2, upper.2) * 255.0).round() as u8,
    ]
}

/// Builds the export display list one element at a time.
pub struct Compositor {
    list: DisplayList,
    mapper: GeometryMapper,
}

impl Compositor {
    /// Allocates a canvas at the supersampling multiple of the background, draws the
    /// background and activates the face clip.
    ///
    /// # Arguments
    ///
    /// * `background` - The decoded background asset
    /// * `billboard` - Fresh on-screen bounds of the billboard face
    pub fn begin(background: Arc<DecodedImage>, billboard: BillboardBounds) -> Result<Self, CanvasError> {
        let width = background.width() * constants::EXPORT_SCALE;
        let height = background.height() * constants::EXPORT_SCALE;
        let canvas = Size::new(width as f32, height as f32);
        let editable = editable_area(canvas);
        let mapper = GeometryMapper::new(billboard, editable);
        log::debug!(
            "Canvas {}x{}, editable {:?}, scale ratio {}",
            width,
            height,
            editable,
            mapper.scale_ratio()
        );

        let mut list = DisplayList::new(width, height);
        list.draw(DrawOp::Image {
            rect: Rect::new(0.0, 0.0, canvas.width, canvas.height),
            image: background,
        })?;
        list.push_clip(ClipPath::billboard_face().to_svg_path(&editable));
        Ok(Self { list, mapper })
    }

    /// The mapper used for every element of this export.
    pub fn mapper(&self) -> &GeometryMapper {
        &self.mapper
    }

    /// Draws a text element.
    pub fn draw_text(&mut self, element: &Element) -> Result<(), CanvasError> {
        let style = TextStyle::from_element(element);
        let rect = self.mapper.map_element(element);
        let layout = layout_text(&style, rect, self.mapper.scale_ratio());
        log::debug!(
            "Text {} at {:?}: {} line(s), font {}",
            element.id,
            rect,
            layout.lines.len(),
            layout.font.shorthand()
        );
        for line in layout.lines {
            self.list.draw(DrawOp::Text {
                text: line.text,
                x: line.x,
                y: line.y,
                anchor: layout.anchor,
                font: layout.font.clone(),
                color: constants::TEXT_COLOR,
            })?;
        }
        Ok(())
    }

    /// Draws an image element contain-fitted into its mapped box.
    pub fn draw_image(&mut self, element: &Element, image: Arc<DecodedImage>) -> Result<(), CanvasError> {
        let rect = self.mapper.map_element(element);
        let placed = contain_fit(image.natural_size(), rect);
        log::debug!("Image {} box {:?} drawn at {:?}", element.id, rect, placed);
        self.list.draw(DrawOp::Image { rect: placed, image })
    }

    /// Draws the gradient overlay, releases the clip and returns the finished list.
    pub fn finish(mut self) -> Result<DisplayList, CanvasError> {
        self.list.draw(DrawOp::VerticalGradient {
            rect: self.mapper.editable(),
            stops: overlay_gradient(),
        })?;
        self.list.pop_clip()?;
        self.list.close()
    }
}
