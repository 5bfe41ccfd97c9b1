//! Built-in 5x7 block font for turning `--text` into a mask.

use textboom::Mask;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Empty dots between letters and between lines.
const SPACING: u32 = 1;
/// Empty dots around the whole banner.
const PADDING: u32 = 2;

/// Rows top to bottom, bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // '?'
    }
}

/// Rasterize `text` with each font dot drawn as a `cell`-pixel square.
///
/// Lines are split on `\n`. Glyph dots are fully opaque white, everything
/// else is transparent.
pub fn render(text: &str, cell: u32) -> Mask {
    let cell = cell.max(1);
    let lines: Vec<Vec<char>> = text.lines().map(|l| l.chars().collect()).collect();
    let columns = lines.iter().map(Vec::len).max().unwrap_or(0) as u32;
    let rows = lines.len().max(1) as u32;

    let dots_wide = (columns * (GLYPH_WIDTH + SPACING)).saturating_sub(SPACING) + 2 * PADDING;
    let dots_high = rows * (GLYPH_HEIGHT + SPACING) - SPACING + 2 * PADDING;

    Mask::from_alpha_fn(dots_wide * cell, dots_high * cell, |x, y| {
        let (dx, dy) = (x / cell, y / cell);
        if dx < PADDING || dy < PADDING {
            return 0;
        }
        let (dx, dy) = (dx - PADDING, dy - PADDING);
        let (col, gx) = (dx / (GLYPH_WIDTH + SPACING), dx % (GLYPH_WIDTH + SPACING));
        let (row, gy) = (dy / (GLYPH_HEIGHT + SPACING), dy % (GLYPH_HEIGHT + SPACING));
        if gx >= GLYPH_WIDTH || gy >= GLYPH_HEIGHT {
            return 0;
        }
        let Some(&c) = lines
            .get(row as usize)
            .and_then(|line| line.get(col as usize))
        else {
            return 0;
        };
        let bits = glyph(c)[gy as usize];
        if bits & (1 << (GLYPH_WIDTH - 1 - gx)) != 0 {
            255
        } else {
            0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let mask = render("AB", 2);
        // 2 glyphs * 5 + 1 spacing + 4 padding = 15 dots wide, 7 + 4 = 11 high
        assert_eq!(mask.width(), 30);
        assert_eq!(mask.height(), 22);
    }

    #[test]
    fn test_space_is_empty() {
        let mask = render("   ", 1);
        assert_eq!(mask.coverage(0), 0);
    }

    #[test]
    fn test_glyph_dots_are_opaque() {
        // 'I': top bar 3, stem 5, bottom bar 3
        let mask = render("I", 1);
        assert_eq!(mask.coverage(0), 11);
        assert_eq!(mask.alpha(PADDING + 2, PADDING + 3), 255);
        assert_eq!(mask.alpha(PADDING, PADDING + 3), 0);
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        assert_eq!(render("hello", 3), render("HELLO", 3));
    }

    #[test]
    fn test_multiline() {
        let mask = render("A\nB", 1);
        assert_eq!(mask.height(), 2 * 7 + 1 + 2 * PADDING);
    }
}
