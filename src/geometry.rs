//! Coordinate mapping between the interactive view and the export canvas.
//!
//! Three spaces are involved:
//! - viewport-absolute pixels, in which elements and [`BillboardBounds`] are stored;
//! - billboard-relative pixels, obtained by subtracting the bounds origin;
//! - export-canvas pixels, in which the editable area is a fixed fraction of the canvas.
//!
//! One scale ratio converts billboard-relative measurements to canvas measurements and is
//! applied uniformly to positions, sizes and font sizes.

use crate::constants;
use crate::types::{BillboardBounds, Element, Point, Rect, Size};

/// Rectangle of the sign face on a canvas of the given size.
pub fn editable_area(canvas: Size) -> Rect {
    Rect::new(
        canvas.width * constants::EDITABLE_X,
        canvas.height * constants::EDITABLE_Y,
        canvas.width * constants::EDITABLE_WIDTH,
        canvas.height * constants::EDITABLE_HEIGHT,
    )
}

/// Maps viewport-absolute element geometry into export-canvas space.
///
/// Build one per export from fresh on-screen bounds; never reuse a mapper across layouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryMapper {
    origin: Point,
    editable: Rect,
    scale_ratio: f32,
}

impl GeometryMapper {
    /// Creates a mapper for the given on-screen billboard and the canvas editable area.
    ///
    /// # Arguments
    ///
    /// * `billboard` - On-screen bounds of the billboard face
    /// * `editable` - The face's rectangle on the export canvas
    pub fn new(billboard: BillboardBounds, editable: Rect) -> Self {
        let width = billboard.width();
        let scale_ratio = if width > 0.0 { editable.width / width } else { 1.0 };
        Self {
            origin: billboard.origin(),
            editable,
            scale_ratio,
        }
    }

    /// Canvas pixels per on-screen pixel.
    pub fn scale_ratio(&self) -> f32 {
        self.scale_ratio
    }

    /// The editable area on the canvas.
    pub fn editable(&self) -> Rect {
        self.editable
    }

    /// Maps a viewport-absolute point to canvas space.
    pub fn map_point(&self, p: Point) -> Point {
        let relative = p - self.origin;
        Point::new(
            self.editable.x + relative.x * self.scale_ratio,
            self.editable.y + relative.y * self.scale_ratio,
        )
    }

    /// Maps an on-screen size to canvas space.
    pub fn map_size(&self, size: Size) -> Size {
        Size::new(size.width * self.scale_ratio, size.height * self.scale_ratio)
    }

    /// Maps an on-screen length (such as a font size) to canvas space.
    pub fn map_length(&self, length: f32) -> f32 {
        length * self.scale_ratio
    }

    /// The element's box on the canvas.
    pub fn map_element(&self, element: &Element) -> Rect {
        Rect::from_origin_size(self.map_point(element.position), self.map_size(element.size))
    }
}

/// Largest rectangle with the image's aspect ratio that fits inside `target`, centred.
///
/// Wider-than-box images fit the width and are centred vertically; all others fit the
/// height and are centred horizontally. The image is never cropped.
pub fn contain_fit(natural: Size, target: Rect) -> Rect {
    let image_aspect = natural.aspect_ratio();
    let box_aspect = target.width / target.height;
    if image_aspect > box_aspect {
        let height = target.width / image_aspect;
        Rect::new(target.x, target.y + (target.height - height) / 2.0, target.width, height)
    } else {
        let width = target.height * image_aspect;
        Rect::new(target.x + (target.width - width) / 2.0, target.y, width, target.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementKind;

    const EPS: f32 = 1e-3;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn editable_area_uses_fixed_fractions() {
        let area = editable_area(Size::new(2000.0, 1000.0));
        assert!(close(area.x, 370.0));
        assert!(close(area.y, 205.0));
        assert!(close(area.width, 1260.0));
        assert!(close(area.height, 427.5));
    }

    #[test]
    fn elements_map_by_one_ratio() {
        let bounds = BillboardBounds::new(100.0, 50.0, 730.0, 300.0);
        let editable = Rect::new(370.0, 205.0, 1260.0, 427.5);
        let mapper = GeometryMapper::new(bounds, editable);
        assert!(close(mapper.scale_ratio(), 2.0));

        let placements = [
            (Point::new(100.0, 50.0), Size::new(50.0, 50.0)),
            (Point::new(150.0, 100.0), Size::new(300.0, 100.0)),
            (Point::new(612.5, 212.25), Size::new(80.0, 120.0)),
        ];
        for (position, size) in placements {
            let el = Element::image(ElementKind::Person, "/p.png", position, size);
            let mapped = mapper.map_element(&el);
            assert!(close(mapped.x, 370.0 + (position.x - 100.0) * 2.0));
            assert!(close(mapped.y, 205.0 + (position.y - 50.0) * 2.0));
            assert!(close(mapped.width, size.width * 2.0));
            assert!(close(mapped.height, size.height * 2.0));
        }
        assert!(close(mapper.map_length(24.0), 48.0));
    }

    #[test]
    fn contain_fit_is_identity_for_matching_aspect() {
        let target = Rect::new(10.0, 20.0, 200.0, 100.0);
        let fitted = contain_fit(Size::new(400.0, 200.0), target);
        assert_eq!(fitted, target);
    }

    #[test]
    fn contain_fit_letterboxes_wide_images() {
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let fitted = contain_fit(Size::new(400.0, 100.0), target);
        assert!(close(fitted.width, 100.0));
        assert!(close(fitted.height, 25.0));
        assert!(close(fitted.y, 37.5));
        assert!(close(fitted.x, 0.0));
    }

    #[test]
    fn contain_fit_pillarboxes_tall_images() {
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let fitted = contain_fit(Size::new(50.0, 200.0), target);
        assert!(close(fitted.width, 25.0));
        assert!(close(fitted.height, 100.0));
        assert!(close(fitted.x, 37.5));
    }
}
