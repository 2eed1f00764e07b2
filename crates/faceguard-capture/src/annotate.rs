//! On-frame annotation: detection boxes, name labels, status banner.
//!
//! All drawing works directly on the RGB buffer with a small built-in
//! 5x7 raster font, so the annotated frame needs no GUI toolkit before
//! it reaches the display collaborator.

use crate::frame::Frame;
use faceguard_core::FaceBox;

pub type Color = [u8; 3];

/// Box and text colors for a recognized identity.
pub const KNOWN_BOX: Color = [0, 255, 0];
pub const KNOWN_TEXT: Color = [0, 0, 0];
/// Box and text colors for an unknown face or intruder.
pub const INTRUDER_BOX: Color = [255, 0, 0];
pub const INTRUDER_TEXT: Color = [255, 255, 255];

const BOX_THICKNESS: u32 = 2;
const LABEL_BAR_HEIGHT: u32 = 35;
const TEXT_SCALE: u32 = 2;
const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Column advance per character, including inter-glyph spacing.
const GLYPH_ADVANCE: u32 = GLYPH_W + 1;

/// Banner shown when a processed frame has no surviving detection.
pub const NO_FACE_BANNER: &str = "Non human object or no face detected";

/// Draw a hollow detection rectangle.
pub fn draw_face_box(frame: &mut Frame, bbox: FaceBox, color: Color) {
    let (l, t, r, b) = clamp_box(frame, bbox);
    for i in 0..BOX_THICKNESS {
        fill_rect(frame, l, t + i, r, t + i + 1, color);
        fill_rect(frame, l, b.saturating_sub(i + 1), r, b.saturating_sub(i), color);
        fill_rect(frame, l + i, t, l + i + 1, b, color);
        fill_rect(frame, r.saturating_sub(i + 1), t, r.saturating_sub(i), b, color);
    }
}

/// Draw the filled name bar along the bottom edge of a detection box.
pub fn draw_face_label(frame: &mut Frame, bbox: FaceBox, text: &str, color: Color, text_color: Color) {
    let (l, _, r, b) = clamp_box(frame, bbox);
    let bar_top = b.saturating_sub(LABEL_BAR_HEIGHT);
    fill_rect(frame, l, bar_top, r, b, color);

    let text_h = GLYPH_H * TEXT_SCALE;
    let x = l + 6;
    let y = b.saturating_sub(6 + text_h);
    draw_text(frame, x, y, text, text_color);
}

/// Draw the fixed status banner near the top-left corner.
pub fn draw_banner(frame: &mut Frame, text: &str) {
    let x: u32 = 10;
    let y: u32 = 16;
    let text_w = text.len() as u32 * GLYPH_ADVANCE * TEXT_SCALE;
    let text_h = GLYPH_H * TEXT_SCALE;
    fill_rect(
        frame,
        x.saturating_sub(5),
        y.saturating_sub(5),
        x + text_w + 5,
        y + text_h + 5,
        INTRUDER_BOX,
    );
    draw_text(frame, x, y, text, INTRUDER_TEXT);
}

fn clamp_box(frame: &Frame, bbox: FaceBox) -> (u32, u32, u32, u32) {
    (
        bbox.left.min(frame.width),
        bbox.top.min(frame.height),
        bbox.right.min(frame.width),
        bbox.bottom.min(frame.height),
    )
}

/// Fill the half-open rectangle [x0, x1) x [y0, y1), clamped to the frame.
fn fill_rect(frame: &mut Frame, x0: u32, y0: u32, x1: u32, y1: u32, color: Color) {
    for y in y0..y1.min(frame.height) {
        for x in x0..x1.min(frame.width) {
            if let Some(px) = frame.pixel_mut(x, y) {
                px.copy_from_slice(&color);
            }
        }
    }
}

/// Render text at (x, y) = top-left, clipping at the frame edges.
fn draw_text(frame: &mut Frame, x: u32, y: u32, text: &str, color: Color) {
    let mut pen_x = x;
    for ch in text.chars() {
        let columns = glyph(ch.to_ascii_uppercase());
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..GLYPH_H {
                if bits & (1 << row) == 0 {
                    continue;
                }
                for dy in 0..TEXT_SCALE {
                    for dx in 0..TEXT_SCALE {
                        let px = pen_x + col as u32 * TEXT_SCALE + dx;
                        let py = y + row * TEXT_SCALE + dy;
                        if let Some(p) = frame.pixel_mut(px, py) {
                            p.copy_from_slice(&color);
                        }
                    }
                }
            }
        }
        pen_x += GLYPH_ADVANCE * TEXT_SCALE;
    }
}

/// 5x7 glyph columns, least-significant bit = top row.
fn glyph(ch: char) -> [u8; 5] {
    match ch {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00],
        'A' => [0x7E, 0x11, 0x11, 0x11, 0x7E],
        'B' => [0x7F, 0x49, 0x49, 0x49, 0x36],
        'C' => [0x3E, 0x41, 0x41, 0x41, 0x22],
        'D' => [0x7F, 0x41, 0x41, 0x22, 0x1C],
        'E' => [0x7F, 0x49, 0x49, 0x49, 0x41],
        'F' => [0x7F, 0x09, 0x09, 0x09, 0x01],
        'G' => [0x3E, 0x41, 0x49, 0x49, 0x7A],
        'H' => [0x7F, 0x08, 0x08, 0x08, 0x7F],
        'I' => [0x00, 0x41, 0x7F, 0x41, 0x00],
        'J' => [0x20, 0x40, 0x41, 0x3F, 0x01],
        'K' => [0x7F, 0x08, 0x14, 0x22, 0x41],
        'L' => [0x7F, 0x40, 0x40, 0x40, 0x40],
        'M' => [0x7F, 0x02, 0x0C, 0x02, 0x7F],
        'N' => [0x7F, 0x04, 0x08, 0x10, 0x7F],
        'O' => [0x3E, 0x41, 0x41, 0x41, 0x3E],
        'P' => [0x7F, 0x09, 0x09, 0x09, 0x06],
        'Q' => [0x3E, 0x41, 0x51, 0x21, 0x5E],
        'R' => [0x7F, 0x09, 0x19, 0x29, 0x46],
        'S' => [0x46, 0x49, 0x49, 0x49, 0x31],
        'T' => [0x01, 0x01, 0x7F, 0x01, 0x01],
        'U' => [0x3F, 0x40, 0x40, 0x40, 0x3F],
        'V' => [0x1F, 0x20, 0x40, 0x20, 0x1F],
        'W' => [0x7F, 0x20, 0x18, 0x20, 0x7F],
        'X' => [0x63, 0x14, 0x08, 0x14, 0x63],
        'Y' => [0x03, 0x04, 0x78, 0x04, 0x03],
        'Z' => [0x61, 0x51, 0x49, 0x45, 0x43],
        '0' => [0x3E, 0x51, 0x49, 0x45, 0x3E],
        '1' => [0x00, 0x42, 0x7F, 0x40, 0x00],
        '2' => [0x42, 0x61, 0x51, 0x49, 0x46],
        '3' => [0x21, 0x41, 0x45, 0x4B, 0x31],
        '4' => [0x18, 0x14, 0x12, 0x7F, 0x10],
        '5' => [0x27, 0x45, 0x45, 0x45, 0x39],
        '6' => [0x3C, 0x4A, 0x49, 0x49, 0x30],
        '7' => [0x01, 0x71, 0x09, 0x05, 0x03],
        '8' => [0x36, 0x49, 0x49, 0x49, 0x36],
        '9' => [0x06, 0x49, 0x49, 0x29, 0x1E],
        '_' => [0x40, 0x40, 0x40, 0x40, 0x40],
        '-' => [0x08, 0x08, 0x08, 0x08, 0x08],
        '.' => [0x00, 0x60, 0x60, 0x00, 0x00],
        ':' => [0x00, 0x36, 0x36, 0x00, 0x00],
        '/' => [0x20, 0x10, 0x08, 0x04, 0x02],
        // Unmapped characters render as a hollow box.
        _ => [0x7F, 0x41, 0x41, 0x41, 0x7F],
    }
}
