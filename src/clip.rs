//! The billboard face silhouette used as a clip region.
//!
//! The outline is stored in coordinates normalized to the editable area and is
//! projected onto any rectangle on demand: as SVG path data for the export surface, or
//! as flattened polygons for the interactive preview.

use crate::constants;
use crate::types::{Point, Rect};
use std::fmt::Write as _;

/// One drawing command of a normalized outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Start a new subpath
    MoveTo(Point),
    /// Straight line to a point
    LineTo(Point),
    /// Cubic Bézier: control 1, control 2, end
    CubicTo(Point, Point, Point),
    /// Close the current subpath
    Close,
}

/// A closed outline in 0..1 coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    segments: Vec<PathSegment>,
}

fn pt((x, y): (f32, f32)) -> Point {
    Point::new(x, y)
}

fn cubic_at(p0: Point, c1: Point, c2: Point, p3: Point, t: f32) -> Point {
    let omt = 1.0 - t;
    let a = omt * omt * omt;
    let b = 3.0 * omt * omt * t;
    let c = 3.0 * omt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * c1.x + c * c2.x + d * p3.x,
        a * p0.y + b * c1.y + c * c2.y + d * p3.y,
    )
}

fn sample_cubic(p0: Point, curve: [(f32, f32); 3], steps: usize) -> Vec<Point> {
    let [c1, c2, end] = curve.map(pt);
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| cubic_at(p0, c1, c2, end, i as f32 / steps as f32))
        .collect()
}

fn project(p: Point, rect: &Rect) -> Point {
    Point::new(rect.x + p.x * rect.width, rect.y + p.y * rect.height)
}

impl ClipPath {
    /// The sign face: left curve up, top edge, right curve down, bottom edge back.
    pub fn billboard_face() -> Self {
        let [l1, l2, l3] = constants::FACE_LEFT_CURVE.map(pt);
        let [r1, r2, r3] = constants::FACE_RIGHT_CURVE.map(pt);
        Self {
            segments: vec![
                PathSegment::MoveTo(pt(constants::FACE_START)),
                PathSegment::CubicTo(l1, l2, l3),
                PathSegment::LineTo(pt(constants::FACE_TOP_RIGHT)),
                PathSegment::CubicTo(r1, r2, r3),
                PathSegment::LineTo(pt(constants::FACE_START)),
                PathSegment::Close,
            ],
        }
    }

    /// The normalized segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// SVG path data for the outline scaled into `rect`.
    pub fn to_svg_path(&self, rect: &Rect) -> String {
        let mut d = String::new();
        for segment in &self.segments {
            if !d.is_empty() {
                d.push(' ');
            }
            let _ = match *segment {
                PathSegment::MoveTo(p) => {
                    let p = project(p, rect);
                    write!(d, "M{:.3},{:.3}", p.x, p.y)
                }
                PathSegment::LineTo(p) => {
                    let p = project(p, rect);
                    write!(d, "L{:.3},{:.3}", p.x, p.y)
                }
                PathSegment::CubicTo(c1, c2, end) => {
                    let (c1, c2, end) = (project(c1, rect), project(c2, rect), project(end, rect));
                    write!(
                        d,
                        "C{:.3},{:.3} {:.3},{:.3} {:.3},{:.3}",
                        c1.x, c1.y, c2.x, c2.y, end.x, end.y
                    )
                }
                PathSegment::Close => write!(d, "Z"),
            };
        }
        d
    }

    /// The outline as a polygon inside `rect`, each curve split into `steps` lines.
    pub fn flatten(&self, rect: &Rect, steps: usize) -> Vec<Point> {
        let mut points: Vec<Point> = Vec::new();
        let mut current = Point::default();
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => {
                    current = p;
                    points.push(p);
                }
                PathSegment::CubicTo(c1, c2, end) => {
                    let steps = steps.max(1);
                    for i in 1..=steps {
                        points.push(cubic_at(current, c1, c2, end, i as f32 / steps as f32));
                    }
                    current = end;
                }
                PathSegment::Close => {}
            }
        }
        // The closing line returns to the start point; drop the duplicate.
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points.into_iter().map(|p| project(p, rect)).collect()
    }

    /// Convex polygons covering the part of `rect` outside the sign face.
    ///
    /// Used by the preview to hide element pixels that fall outside the silhouette.
    pub fn outside_bands(rect: &Rect, steps: usize) -> Vec<Vec<Point>> {
        let start = pt(constants::FACE_START);
        let top_left = pt(constants::FACE_LEFT_CURVE[2]);
        let top_right = pt(constants::FACE_TOP_RIGHT);
        let bottom_right = pt(constants::FACE_RIGHT_CURVE[2]);
        let left = sample_cubic(start, constants::FACE_LEFT_CURVE, steps);
        let right = sample_cubic(top_right, constants::FACE_RIGHT_CURVE, steps);

        let mut bands: Vec<Vec<Point>> = Vec::new();
        // Above the top edge
        bands.push(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, top_right.y),
            Point::new(0.0, top_left.y),
        ]);
        // Between the left edge of the rectangle and the left curve
        for pair in left.windows(2) {
            bands.push(vec![
                Point::new(0.0, pair[0].y),
                pair[0],
                pair[1],
                Point::new(0.0, pair[1].y),
            ]);
        }
        // Between the right curve and the right edge of the rectangle
        for pair in right.windows(2) {
            bands.push(vec![
                pair[0],
                Point::new(1.0, pair[0].y),
                Point::new(1.0, pair[1].y),
                pair[1],
            ]);
        }
        // Below the bottom edge
        bands.push(vec![
            Point::new(0.0, 1.0),
            Point::new(0.0, start.y),
            start,
            bottom_right,
            Point::new(1.0, bottom_right.y),
            Point::new(1.0, 1.0),
        ]);

        bands
            .into_iter()
            .map(|band| band.into_iter().map(|p| project(p, rect)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_path_projects_into_rect() {
        let rect = Rect::new(100.0, 200.0, 1000.0, 500.0);
        let d = ClipPath::billboard_face().to_svg_path(&rect);
        assert!(d.starts_with("M138.900,697.200"));
        assert!(d.contains("C173.100,486.500 126.200,289.900 100.900,200.700"));
        assert!(d.contains("L1098.600,200.700"));
        assert!(d.ends_with("L138.900,697.200 Z"));
    }

    #[test]
    fn flattened_outline_stays_inside_rect() {
        let rect = Rect::new(10.0, 10.0, 200.0, 100.0);
        let polygon = ClipPath::billboard_face().flatten(&rect, 8);
        assert_eq!(polygon.len(), 1 + 8 + 1 + 8);
        for p in &polygon {
            assert!(rect.contains(*p), "{p:?} outside {rect:?}");
        }
    }

    #[test]
    fn outside_bands_hug_the_left_curve() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        let bands = ClipPath::outside_bands(&rect, 4);
        // top + 4 left + 4 right + bottom
        assert_eq!(bands.len(), 10);
        let first_left = &bands[1];
        assert_eq!(first_left[0].x, 0.0);
        assert!((first_left[1].x - 0.0389).abs() < 1e-6);
        assert!((first_left[1].y - 0.9944).abs() < 1e-6);
    }
}
