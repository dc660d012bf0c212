//! Ordered drawing operations for the export surface.
//!
//! The renderer records what to draw; [`crate::raster`] turns the list into pixels.
//! Clip regions are pushed and popped explicitly, and a list can only be closed once
//! every clip has been released.

use crate::assets::DecodedImage;
use crate::error::CanvasError;
use crate::style::FontSpec;
use crate::types::{Rect, TextAlign};
use std::sync::Arc;

/// One stop of a linear gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient, 0..1
    pub offset: f32,
    /// Colour
    pub rgb: [u8; 3],
    /// Opacity, 0..1
    pub alpha: f32,
}

/// A drawing operation in canvas pixels.
#[derive(Debug, Clone)]
pub enum DrawOp {
    /// Draw an image stretched to `rect`
    Image {
        /// Destination rectangle
        rect: Rect,
        /// Decoded source
        image: Arc<DecodedImage>,
    },
    /// Restrict subsequent drawing to the area inside an SVG path
    PushClip {
        /// SVG path data in canvas pixels
        path: String,
    },
    /// Release the most recent clip
    PopClip,
    /// Fill one line of text with its vertical middle at `y`
    Text {
        /// The text run
        text: String,
        /// Anchor x
        x: f32,
        /// Middle y
        y: f32,
        /// Which side of the run sits at `x`
        anchor: TextAlign,
        /// Face and size
        font: FontSpec,
        /// Fill colour
        color: [u8; 3],
    },
    /// Fill `rect` with a top-to-bottom linear gradient
    VerticalGradient {
        /// Filled rectangle (also the gradient's extent)
        rect: Rect,
        /// Colour stops
        stops: Vec<GradientStop>,
    },
}

/// A sized canvas and the operations drawn onto it.
#[derive(Debug, Clone)]
pub struct DisplayList {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
    clip_depth: usize,
}

impl DisplayList {
    /// Starts an empty list for a `width`×`height` canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            clip_depth: 0,
        }
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The recorded operations, in drawing order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Number of clips currently active.
    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    /// Records a drawing operation, routing clip operations through the clip stack.
    pub fn draw(&mut self, op: DrawOp) -> Result<(), CanvasError> {
        match op {
            DrawOp::PushClip { path } => self.push_clip(path),
            DrawOp::PopClip => return self.pop_clip(),
            op => self.ops.push(op),
        }
        Ok(())
    }

    /// Activates a clip region for everything drawn until the matching pop.
    pub fn push_clip(&mut self, path: String) {
        self.clip_depth += 1;
        self.ops.push(DrawOp::PushClip { path });
    }

    /// Releases the innermost clip region.
    pub fn pop_clip(&mut self) -> Result<(), CanvasError> {
        if self.clip_depth == 0 {
            return Err(CanvasError::ClipUnderflow);
        }
        self.clip_depth -= 1;
        self.ops.push(DrawOp::PopClip);
        Ok(())
    }

    /// Checks that every clip has been released.
    pub fn close(self) -> Result<Self, CanvasError> {
        if self.clip_depth != 0 {
            return Err(CanvasError::UnbalancedClip(self.clip_depth));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_clip_is_rejected() {
        let mut list = DisplayList::new(10, 10);
        list.push_clip("M0,0 L10,0 L10,10 Z".into());
        assert_eq!(list.clip_depth(), 1);
        assert_eq!(list.clone().close().unwrap_err(), CanvasError::UnbalancedClip(1));
        list.pop_clip().unwrap();
        assert_eq!(list.pop_clip(), Err(CanvasError::ClipUnderflow));
        assert_eq!(list.close().unwrap().ops().len(), 2);
    }
}
