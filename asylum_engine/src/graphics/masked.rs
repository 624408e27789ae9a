//! Drawing a frame behind a 1-bit occlusion mask.
//!
//! Spill regions (the parts of the frame outside the mask rectangle) are
//! drawn color-keyed; the overlap honours the mask, where a set bit hides
//! the frame pixel.

use std::borrow::Cow;

use asylum_formats::{GraphicFrame, MaskData};

use super::blit::{blit_raw_color_key, Source, Target};
use super::surface::{Rect, Surface};

/// Already-clipped rectangles for one masked draw.
#[derive(Debug, Clone, Copy)]
pub struct MaskedDraw {
    pub source: Rect,
    pub destination: Rect,
    pub source_mask: Rect,
    pub destination_mask: Rect,
    pub mirrored: bool,
}

pub fn blit_masked(back: &mut Surface, frame: &GraphicFrame, mask: &MaskData, draw: MaskedDraw) {
    let MaskedDraw {
        mut source,
        mut destination,
        mut source_mask,
        mut destination_mask,
        mirrored,
    } = draw;

    // Mask coordinates are taken relative to the mask's absolute origin, so
    // the rectangle adjustments below never shift the bit pattern.
    let mask_origin_x = destination_mask.left - source_mask.left;
    let mask_origin_y = destination_mask.top - source_mask.top;

    let (pixels, pitch) = if mirrored {
        let width = source.right.max(0) as usize;
        let height = source.bottom.max(0) as usize;
        let mut flipped = vec![0u8; width * height];
        for y in 0..height {
            let row = y * frame.pitch();
            for col in 0..width {
                flipped[y * width + col] = frame.pixels[row + width - 1 - col];
            }
        }
        source = Rect::new(0, source.top, source.right - source.left, source.bottom);
        (Cow::Owned(flipped), width)
    } else {
        (Cow::Borrowed(frame.pixels.as_slice()), frame.pitch())
    };

    let mut ctx = MaskContext {
        back,
        pixels: &pixels,
        pitch,
    };

    if destination_mask.left + source_mask.width() < destination.left
        || destination.left + source.width() < destination_mask.left
        || destination_mask.top + source_mask.height() < destination.top
        || destination.top + source.height() < destination_mask.top
    {
        ctx.color_key(source, destination.left, destination.top);
        return;
    }

    if destination.left > destination_mask.left {
        source_mask.set_width(source_mask.width() + destination_mask.left - destination.left);
        destination_mask.left = destination.left;
    }

    if destination.top > destination_mask.top {
        source_mask.set_height(source_mask.height() + destination_mask.top - destination.top);
        destination_mask.top = destination.top;
    }

    // Left
    if destination.left < destination_mask.left {
        let spill = destination_mask.left - destination.left;
        let mut part = source;
        part.set_width(spill);
        ctx.color_key(part, destination.left, destination.top);

        source.left += spill;
        destination.left = destination_mask.left;
    }

    // Right
    let mask_right = destination_mask.left + source_mask.width();
    if source.width() + destination.left > mask_right {
        let inside = mask_right - destination.left;
        let part = Rect::new(source.left + inside, source.top, source.right, source.bottom);
        ctx.color_key(part, mask_right, destination.top);

        source.set_width(inside);
    }

    // Top
    if destination.top < destination_mask.top {
        let spill = destination_mask.top - destination.top;
        let mut part = source;
        part.set_height(spill);
        ctx.color_key(part, destination.left, destination.top);

        source.top += spill;
        destination.top = destination_mask.top;
    }

    // Bottom
    let mask_bottom = destination_mask.top + source_mask.height();
    if source.height() + destination.top > mask_bottom {
        let inside = mask_bottom - destination.top;
        let part = Rect::new(source.left, source.top + inside, source.right, source.bottom);
        ctx.color_key(part, destination.left, mask_bottom);

        source.set_height(inside);
    }

    if source.width() <= 0 || source.height() <= 0 {
        return;
    }

    for row in 0..source.height() {
        let y = destination.top + row;
        let src_row = (source.top + row) as usize * ctx.pitch;
        let dst_row = y as usize * ctx.back.pitch();
        for col in 0..source.width() {
            let x = destination.left + col;
            let value = ctx.pixels[src_row + (source.left + col) as usize];
            if value == 0 || hidden(mask, x - mask_origin_x, y - mask_origin_y) {
                continue;
            }
            ctx.back.pixels_mut()[dst_row + x as usize] = value;
        }
    }
}

fn hidden(mask: &MaskData, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && mask.is_set(x as u32, y as u32)
}

struct MaskContext<'a> {
    back: &'a mut Surface,
    pixels: &'a [u8],
    pitch: usize,
}

impl MaskContext<'_> {
    fn color_key(&mut self, source: Rect, x: i32, y: i32) {
        if source.width() <= 0 || source.height() <= 0 {
            return;
        }
        let pitch = self.back.pitch();
        blit_raw_color_key(
            Target::new(self.back.pixels_mut(), pitch, x as usize, y as usize),
            Source::new(self.pixels, self.pitch, source.left as usize, source.top as usize),
            source.width() as usize,
            source.height() as usize,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_hidden_columns(width: u32, height: u32, hidden_from: u32) -> MaskData {
        let stride = width.div_ceil(8) as usize;
        let mut bits = vec![0u8; stride * height as usize];
        for y in 0..height as usize {
            for x in hidden_from..width {
                bits[y * stride + (x / 8) as usize] |= 1 << (x % 8);
            }
        }
        MaskData {
            width,
            height,
            bits,
        }
    }

    fn full(rect_w: i32, rect_h: i32) -> Rect {
        Rect::new(0, 0, rect_w, rect_h)
    }

    #[test]
    fn mask_hides_set_bits_and_spills_draw_keyed() {
        let mut back = Surface::new(16, 4);
        back.fill(0xEE);
        let frame = GraphicFrame::solid(8, 2, 3);
        // Mask covers x 4..12; columns 8.. of the mask hide the frame.
        let mask = mask_with_hidden_columns(8, 4, 4);

        blit_masked(
            &mut back,
            &frame,
            &mask,
            MaskedDraw {
                source: full(8, 2),
                destination: Rect::new(2, 1, 10, 3),
                source_mask: full(8, 4),
                destination_mask: Rect::new(4, 0, 12, 4),
                mirrored: false,
            },
        );

        // Left spill.
        assert_eq!(back.pixel(2, 1), Some(3));
        assert_eq!(back.pixel(3, 2), Some(3));
        // Inside the mask, visible columns.
        assert_eq!(back.pixel(4, 1), Some(3));
        assert_eq!(back.pixel(7, 2), Some(3));
        // Inside the mask, hidden columns.
        assert_eq!(back.pixel(8, 1), Some(0xEE));
        assert_eq!(back.pixel(9, 2), Some(0xEE));
        // Outside the frame.
        assert_eq!(back.pixel(1, 1), Some(0xEE));
        assert_eq!(back.pixel(4, 0), Some(0xEE));
    }

    #[test]
    fn disjoint_mask_draws_everything_keyed() {
        let mut back = Surface::new(32, 4);
        let pixels = vec![1, 0, 2, 3];
        let frame = GraphicFrame::new(0, 0, 4, 1, pixels).unwrap();
        let mask = mask_with_hidden_columns(8, 4, 0);
        back.fill(9);

        blit_masked(
            &mut back,
            &frame,
            &mask,
            MaskedDraw {
                source: full(4, 1),
                destination: Rect::new(0, 0, 4, 1),
                source_mask: full(8, 4),
                destination_mask: Rect::new(20, 0, 28, 4),
                mirrored: false,
            },
        );

        let row: Vec<u8> = (0..4).filter_map(|x| back.pixel(x, 0)).collect();
        assert_eq!(row, vec![1, 9, 2, 3]);
    }

    #[test]
    fn mirrored_frame_is_flipped_before_masking() {
        let mut back = Surface::new(8, 1);
        let frame = GraphicFrame::new(0, 0, 4, 1, vec![1, 2, 3, 4]).unwrap();
        let mask = mask_with_hidden_columns(8, 1, 8);

        blit_masked(
            &mut back,
            &frame,
            &mask,
            MaskedDraw {
                source: full(4, 1),
                destination: Rect::new(0, 0, 4, 1),
                source_mask: full(8, 1),
                destination_mask: Rect::new(0, 0, 8, 1),
                mirrored: true,
            },
        );

        let row: Vec<u8> = (0..4).filter_map(|x| back.pixel(x, 0)).collect();
        assert_eq!(row, vec![4, 3, 2, 1]);
    }
}
