//! Shared application-wide constants.
//! Centralizes the values that both the interactive billboard overlay and the
//! export pipeline depend on, so the preview and the exported PNG cannot drift apart.

// Editable area (fractions of the background image size)
/// Left edge of the sign face as a fraction of the background width.
pub const EDITABLE_X: f32 = 0.185;
/// Top edge of the sign face as a fraction of the background height.
pub const EDITABLE_Y: f32 = 0.205;
/// Width of the sign face as a fraction of the background width.
pub const EDITABLE_WIDTH: f32 = 0.63;
/// Height of the sign face as a fraction of the background height.
pub const EDITABLE_HEIGHT: f32 = 0.4275;

// Sign face silhouette, normalized 0..1 inside the editable area
/// Start (and end) point of the silhouette: bottom of the left edge.
pub const FACE_START: (f32, f32) = (0.0389, 0.9944);
/// Left edge cubic: control 1, control 2, end (top-left corner).
pub const FACE_LEFT_CURVE: [(f32, f32); 3] = [(0.0731, 0.5730), (0.0262, 0.1798), (0.0009, 0.0014)];
/// Top-right corner reached by a straight line along the top edge.
pub const FACE_TOP_RIGHT: (f32, f32) = (0.9986, 0.0014);
/// Right edge cubic: control 1, control 2, end (bottom-right corner).
pub const FACE_RIGHT_CURVE: [(f32, f32); 3] = [(0.9682, 0.1469), (0.9173, 0.5498), (0.9563, 0.9972)];

// Gradient overlay
/// Vertical shading stops across the editable area: (offset, rgb, alpha).
pub const OVERLAY_GRADIENT: [(f32, [u8; 3], f32); 4] = [
    (0.0, [0, 0, 0], 0.2),
    (0.48, [102, 102, 102], 0.3),
    (0.52, [102, 102, 102], 0.3),
    (1.0, [0, 0, 0], 0.2),
];

// Text
/// Fill colour used for all billboard text.
pub const TEXT_COLOR: [u8; 3] = [0xD8, 0xD8, 0xC7];
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;
/// Font size used when the markup and the element carry none.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
/// Family used when the markup declares none.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
/// Families appended after the chosen family in every font declaration.
pub const FALLBACK_FONT_FAMILIES: &str = "Arial, sans-serif";

// Elements
/// Smallest width or height an element may be resized to.
pub const MIN_ELEMENT_SIZE: f32 = 50.0;
/// Height of a newly placed person image.
pub const PERSON_HEIGHT: f32 = 150.0;
/// Height of a newly placed logo image.
pub const LOGO_HEIGHT: f32 = 120.0;
/// Size of a newly placed text box.
pub const TEXT_BOX_SIZE: (f32, f32) = (300.0, 100.0);
/// Offset of new elements from the billboard's top-left corner.
pub const NEW_ELEMENT_INSET: f32 = 50.0;
/// Distance of a new logo's left edge from the billboard's right edge.
pub const LOGO_RIGHT_INSET: f32 = 200.0;
/// Diagonal step between consecutive new text boxes.
pub const TEXT_STACK_OFFSET: f32 = 20.0;
/// Plain-text content of a new text box.
pub const DEFAULT_TEXT: &str = "EDIT ME";
/// Markup of a new text box.
pub const DEFAULT_TEXT_MARKUP: &str =
    r#"<p style="text-align: center"><span style="font-family: Oswald; font-size: 24px">EDIT ME</span></p>"#;

// Export
/// Supersampling multiple applied to the background's natural size.
pub const EXPORT_SCALE: u32 = 2;
/// File name handed to the download/save action.
pub const EXPORT_FILE_NAME: &str = "billboard-hq.png";

// Canvas interactions
/// Side length of the square corner handles (screen pixels).
pub const HANDLE_SIZE: f32 = 12.0;
/// Padding between the canvas panel edge and the billboard image.
pub const CANVAS_PADDING: f32 = 32.0;
/// Number of line segments used to flatten each silhouette curve for the preview.
pub const CURVE_SEGMENTS: usize = 24;
