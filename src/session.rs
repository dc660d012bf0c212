//! Editing session state.
//!
//! One [`Session`] owns the element collection, the selection and the current billboard
//! bounds. Every change goes through [`Session::apply`], which keeps elements inside the
//! bounds and at least [`constants::MIN_ELEMENT_SIZE`] on each side.
//!
//! Besides the on-screen boxes the session remembers where the user put each element
//! relative to the billboard, in units of the billboard width. When the bounds change,
//! boxes are rebuilt from that layout, so shrinking the window and growing it back
//! restores the arrangement exactly.

use crate::constants;
use crate::export::SceneSnapshot;
use crate::style::{plain_text, TextStyle};
use crate::types::{BillboardBounds, Element, ElementId, ElementKind, Point, Rect, ResizeCorner, Size};
use std::collections::HashMap;

/// A state transition of the editing session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// The billboard's on-screen rectangle changed; elements follow its origin
    SetBounds(BillboardBounds),
    /// Place a person image at its default position
    AddPerson {
        /// Image source
        source: String,
        /// Natural pixel size of the image
        natural: Size,
    },
    /// Place a logo image at its default position
    AddLogo {
        /// Image source
        source: String,
        /// Natural pixel size of the image
        natural: Size,
    },
    /// Place a new default text box
    AddText,
    /// Change (or clear) the selection
    Select(Option<ElementId>),
    /// Move an element's top-left corner
    Move {
        /// Target element
        id: ElementId,
        /// Requested position, clamped into the bounds
        position: Point,
    },
    /// Resize from a corner handle, keeping the aspect ratio of `start`
    Resize {
        /// Target element
        id: ElementId,
        /// Handle being dragged
        corner: ResizeCorner,
        /// The element's box when the drag began
        start: Rect,
        /// Pointer travel since the drag began
        delta: Point,
    },
    /// Replace a text element's markup
    EditText {
        /// Target element
        id: ElementId,
        /// New markup
        markup: String,
    },
    /// Remove an element
    Delete(ElementId),
    /// Remove the selected element, if any
    DeleteSelected,
}

/// Elements, selection and bounds of the open billboard.
#[derive(Debug, Clone, Default)]
pub struct Session {
    elements: Vec<Element>,
    selected: Option<ElementId>,
    bounds: BillboardBounds,
    /// Element boxes relative to the bounds origin, divided by the bounds width
    layout: HashMap<ElementId, Rect>,
}

fn has_area(bounds: &BillboardBounds) -> bool {
    bounds.width() > 0.0 && bounds.height() > 0.0
}

/// Moves `position` so a box of `size` lies inside `bounds` (left/top win when it cannot).
fn clamp_position(position: Point, size: Size, bounds: &BillboardBounds) -> Point {
    if !has_area(bounds) {
        return position;
    }
    Point::new(
        position.x.min(bounds.right - size.width).max(bounds.left),
        position.y.min(bounds.bottom - size.height).max(bounds.top),
    )
}

/// Scales `size` down, keeping its aspect ratio, until it fits in `bounds`.
fn fit_size(size: Size, bounds: &BillboardBounds) -> Size {
    if !has_area(bounds) {
        return size;
    }
    let factor = (bounds.width() / size.width)
        .min(bounds.height() / size.height)
        .min(1.0);
    Size::new(size.width * factor, size.height * factor)
}

/// Grows `size` uniformly until both sides reach the minimum element size.
fn enforce_minimum(size: Size) -> Size {
    if size.width <= 0.0 || size.height <= 0.0 {
        return size;
    }
    let factor = (constants::MIN_ELEMENT_SIZE / size.width)
        .max(constants::MIN_ELEMENT_SIZE / size.height)
        .max(1.0);
    Size::new(size.width * factor, size.height * factor)
}

/// Fits `rect` into `bounds`. The minimum size wins over the bounds.
fn place(rect: Rect, bounds: &BillboardBounds) -> Rect {
    let size = enforce_minimum(fit_size(rect.size(), bounds));
    Rect::from_origin_size(clamp_position(rect.origin(), size, bounds), size)
}

/// Box after dragging `corner` of `start` by `delta`.
///
/// One factor, driven by the horizontal travel, scales both sides. The factor is raised
/// until both sides reach the minimum size and lowered until the box fits between the
/// fixed opposite corner and the bounds; the minimum size wins if both cannot hold.
pub fn resize_from_corner(start: Rect, corner: ResizeCorner, delta: Point, bounds: &BillboardBounds) -> Rect {
    if start.width <= 0.0 || start.height <= 0.0 {
        return start;
    }
    let grows_right = matches!(corner, ResizeCorner::TopRight | ResizeCorner::BottomRight);
    let grows_down = matches!(corner, ResizeCorner::BottomLeft | ResizeCorner::BottomRight);

    let proposed_width = if grows_right {
        start.width + delta.x
    } else {
        start.width - delta.x
    };
    let mut factor = proposed_width / start.width;

    // Fixed corner
    let anchor_x = if grows_right { start.x } else { start.right() };
    let anchor_y = if grows_down { start.y } else { start.bottom() };

    if has_area(bounds) {
        let room_x = if grows_right { bounds.right - anchor_x } else { anchor_x - bounds.left };
        let room_y = if grows_down { bounds.bottom - anchor_y } else { anchor_y - bounds.top };
        factor = factor.min(room_x / start.width).min(room_y / start.height);
    }
    let min_factor = (constants::MIN_ELEMENT_SIZE / start.width).max(constants::MIN_ELEMENT_SIZE / start.height);
    factor = factor.max(min_factor);

    let width = start.width * factor;
    let height = start.height * factor;
    let x = if grows_right { anchor_x } else { anchor_x - width };
    let y = if grows_down { anchor_y } else { anchor_y - height };
    let position = clamp_position(Point::new(x, y), Size::new(width, height), bounds);
    Rect::new(position.x, position.y, width, height)
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements in drawing order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Looks up an element.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// The selected element id.
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// The selected element.
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.and_then(|id| self.element(id))
    }

    /// Current billboard bounds.
    pub fn bounds(&self) -> BillboardBounds {
        self.bounds
    }

    /// Copies everything an export needs.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            elements: self.elements.clone(),
            bounds: self.bounds,
        }
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let id = element.id;
        log::debug!("Added {:?} element {}", element.kind, id);
        self.elements.push(element);
        self.selected = Some(id);
        self.remember(id);
        id
    }

    /// Records the current box of `id` as the user's layout.
    fn remember(&mut self, id: ElementId) {
        if !has_area(&self.bounds) {
            return;
        }
        let Some(rect) = self.element(id).map(Element::rect) else {
            return;
        };
        let origin = self.bounds.origin();
        let unit = self.bounds.width();
        self.layout.insert(
            id,
            Rect::new(
                (rect.x - origin.x) / unit,
                (rect.y - origin.y) / unit,
                rect.width / unit,
                rect.height / unit,
            ),
        );
    }

    fn add_image(&mut self, kind: ElementKind, source: String, natural: Size, height: f32, position: Point) -> ElementId {
        let aspect = if natural.width > 0.0 && natural.height > 0.0 {
            natural.aspect_ratio()
        } else {
            1.0
        };
        let size = fit_size(Size::new(height * aspect, height), &self.bounds);
        let position = clamp_position(position, size, &self.bounds);
        self.insert(Element::image(kind, source, position, size))
    }

    /// Applies `action`, returning the id of the element it created, if any.
    pub fn apply(&mut self, action: SessionAction) -> Option<ElementId> {
        match action {
            SessionAction::SetBounds(bounds) => {
                if bounds != self.bounds {
                    self.bounds = bounds;
                    let unit = bounds.width();
                    let origin = bounds.origin();
                    let mut unplaced = Vec::new();
                    for element in &mut self.elements {
                        let rect = match self.layout.get(&element.id) {
                            Some(l) if has_area(&bounds) => {
                                Rect::new(origin.x + l.x * unit, origin.y + l.y * unit, l.width * unit, l.height * unit)
                            }
                            Some(_) => element.rect(),
                            None => {
                                unplaced.push(element.id);
                                element.rect()
                            }
                        };
                        let placed = place(rect, &bounds);
                        element.position = placed.origin();
                        element.size = placed.size();
                    }
                    // First measurement: adopt the clamped boxes as the layout
                    for id in unplaced {
                        self.remember(id);
                    }
                }
                None
            }
            SessionAction::AddPerson { source, natural } => {
                let origin = self.bounds.origin();
                let position = Point::new(
                    origin.x + constants::NEW_ELEMENT_INSET,
                    origin.y + constants::NEW_ELEMENT_INSET,
                );
                Some(self.add_image(ElementKind::Person, source, natural, constants::PERSON_HEIGHT, position))
            }
            SessionAction::AddLogo { source, natural } => {
                let position = Point::new(
                    self.bounds.right - constants::LOGO_RIGHT_INSET,
                    self.bounds.top + constants::NEW_ELEMENT_INSET,
                );
                Some(self.add_image(ElementKind::Logo, source, natural, constants::LOGO_HEIGHT, position))
            }
            SessionAction::AddText => {
                let stacked = self.elements.iter().filter(|e| e.kind == ElementKind::Text).count() as f32;
                let offset = constants::NEW_ELEMENT_INSET + stacked * constants::TEXT_STACK_OFFSET;
                let (w, h) = constants::TEXT_BOX_SIZE;
                let size = fit_size(Size::new(w, h), &self.bounds);
                let position = clamp_position(
                    Point::new(self.bounds.left + offset, self.bounds.top + offset),
                    size,
                    &self.bounds,
                );
                Some(self.insert(Element::text(
                    constants::DEFAULT_TEXT,
                    constants::DEFAULT_TEXT_MARKUP,
                    constants::DEFAULT_FONT_SIZE,
                    position,
                    size,
                )))
            }
            SessionAction::Select(id) => {
                self.selected = id.filter(|id| self.element(*id).is_some());
                None
            }
            SessionAction::Move { id, position } => {
                let bounds = self.bounds;
                if let Some(element) = self.element_mut(id) {
                    element.position = clamp_position(position, element.size, &bounds);
                }
                self.remember(id);
                None
            }
            SessionAction::Resize {
                id,
                corner,
                start,
                delta,
            } => {
                let bounds = self.bounds;
                if let Some(element) = self.element_mut(id) {
                    let rect = resize_from_corner(start, corner, delta, &bounds);
                    element.position = rect.origin();
                    element.size = rect.size();
                }
                self.remember(id);
                None
            }
            SessionAction::EditText { id, markup } => {
                if let Some(element) = self.element_mut(id).filter(|e| e.kind == ElementKind::Text) {
                    let style = TextStyle::extract(&markup, element.font_size, &element.content);
                    element.content = plain_text(&markup).trim().to_uppercase();
                    element.font_size = Some(style.font_size_px);
                    element.styled_content = Some(markup);
                }
                None
            }
            SessionAction::Delete(id) => {
                self.remove(id);
                None
            }
            SessionAction::DeleteSelected => {
                if let Some(id) = self.selected {
                    self.remove(id);
                }
                None
            }
        }
    }

    fn remove(&mut self, id: ElementId) {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.layout.remove(&id);
        if self.elements.len() != before {
            log::debug!("Deleted element {}", id);
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
    }
}
