//! Page geometry for report documents (US Letter, millimetres).
//!
//! Vertical positions here are measured from the top edge of the page; the
//! renderer converts them to PDF's bottom-up coordinates.

use std::ops::Range;

pub const PAGE_WIDTH_MM: f32 = 215.9;
pub const PAGE_HEIGHT_MM: f32 = 279.4;
pub const MARGIN_MM: f32 = 17.6;

/// Horizontal gap between the two cells of a row
pub const GUTTER_MM: f32 = 7.0;
pub const CELL_WIDTH_MM: f32 = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM - GUTTER_MM) / 2.0;
pub const CELL_HEIGHT_MM: f32 = 63.5;
/// Vertical gap between consecutive rows
pub const ROW_GAP_MM: f32 = 10.6;
pub const IMAGES_PER_ROW: usize = 2;

/// Top of the category heading on the first page of a section
pub const HEADING_TOP_MM: f32 = MARGIN_MM;
/// Top of the first row on the page that carries the heading
pub const FIRST_ROW_TOP_MM: f32 = 28.2;
/// No cell may extend below this line; the footer lives underneath
pub const CONTENT_BOTTOM_MM: f32 = 233.5;
/// Baseline of the footer line
pub const FOOTER_TOP_MM: f32 = PAGE_HEIGHT_MM - 14.1;

/// One row of the image grid
#[derive(Debug, Clone, PartialEq)]
pub struct RowPlacement {
    /// Page index inside the section; 0 is the page with the heading
    pub page: usize,
    pub top_mm: f32,
    /// Indices of the images placed in this row
    pub images: Range<usize>,
}

impl RowPlacement {
    pub fn bottom_mm(&self) -> f32 {
        self.top_mm + CELL_HEIGHT_MM
    }
}

/// Place `count` images two per row. A row that would cross
/// `CONTENT_BOTTOM_MM` starts a new page at the top margin.
pub fn plan_rows(count: usize) -> Vec<RowPlacement> {
    let mut rows = Vec::with_capacity(count.div_ceil(IMAGES_PER_ROW));
    let mut page = 0;
    let mut top = FIRST_ROW_TOP_MM;

    for first in (0..count).step_by(IMAGES_PER_ROW) {
        if top + CELL_HEIGHT_MM > CONTENT_BOTTOM_MM {
            page += 1;
            top = MARGIN_MM;
        }

        rows.push(RowPlacement {
            page,
            top_mm: top,
            images: first..(first + IMAGES_PER_ROW).min(count),
        });

        top += CELL_HEIGHT_MM + ROW_GAP_MM;
    }

    rows
}

/// Left edge of a cell
pub fn cell_x(column: usize) -> f32 {
    MARGIN_MM + column as f32 * (CELL_WIDTH_MM + GUTTER_MM)
}

/// Largest size with the image's aspect ratio that fits the box
pub fn fit_within(width_px: u32, height_px: u32, box_w_mm: f32, box_h_mm: f32) -> (f32, f32) {
    if width_px == 0 || height_px == 0 {
        return (0.0, 0.0);
    }

    let ratio = width_px as f32 / height_px as f32;
    if box_w_mm / box_h_mm > ratio {
        (box_h_mm * ratio, box_h_mm)
    } else {
        (box_w_mm, box_w_mm / ratio)
    }
}

/// Greedy word wrap on character count
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
