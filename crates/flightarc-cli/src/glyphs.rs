//! 3x5 bitmap font covering the clock label.

use image::{Rgb, RgbImage};

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;

/// Rows top to bottom, most significant of the low three bits is the left column.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        ' ' => [0; 5],
        _ => return None,
    };
    Some(rows)
}

/// Pixel size of `text` at `scale`, one blank column between glyphs.
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let count = text.chars().count() as u32;
    if count == 0 {
        return (0, 0);
    }
    (
        (count * (GLYPH_WIDTH + 1) - 1) * scale,
        GLYPH_HEIGHT * scale,
    )
}

/// Stamp `text` with its top-left corner at (x, y). Unknown characters leave a gap.
pub fn draw_text(image: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let origin_x = x + i as u32 * (GLYPH_WIDTH + 1) * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = origin_x + col * scale + dx;
                        let py = y + row as u32 * scale + dy;
                        if px < width && py < height {
                            image.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_label_characters_are_covered() {
        assert!("0123456789: EST".chars().all(|c| glyph(c).is_some()));
        assert!(glyph('x').is_none());
    }

    #[test]
    fn test_text_size() {
        assert_eq!(text_size("", 2), (0, 0));
        assert_eq!(text_size("1", 1), (3, 5));
        assert_eq!(text_size("12:00:00 EST", 2), ((12 * 4 - 1) * 2, 10));
    }

    #[test]
    fn test_draw_one_and_clip_at_edge() {
        let white = Rgb([255, 255, 255]);
        let mut image = RgbImage::new(4, 4);
        draw_text(&mut image, "1", 0, 0, 1, white);

        // top row of '1' is the middle column only
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(1, 0), &white);
        assert_eq!(image.get_pixel(0, 1), &white);
        // most of "88" falls outside the 4px image
        draw_text(&mut image, "88", 2, 2, 1, white);
        assert_eq!(image.get_pixel(2, 3), &white);
        assert_eq!(image.get_pixel(3, 3), &Rgb([0, 0, 0]));
    }
}
