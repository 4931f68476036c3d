//! Drawing-surface defaults and rendered output types.

/// Default output image dimensions (pixels).
pub const PLOT_WIDTH: u32 = 900;
pub const PLOT_HEIGHT: u32 = 900;

/// A rendered slope field image.
#[derive(Debug, Clone)]
pub struct RenderedField {
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}
