//! Pixel copy loops shared by the compositor.
//!
//! Every routine takes already-clipped coordinates. A source value of zero is
//! the color key: the keyed variants, the transparency-table variants and the
//! crossfade never write a destination pixel for it.

use asylum_formats::TransTable;

/// Read window into a pixel buffer; `x`/`y` name the first pixel read.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub pixels: &'a [u8],
    pub pitch: usize,
    pub x: usize,
    pub y: usize,
}

impl<'a> Source<'a> {
    pub fn new(pixels: &'a [u8], pitch: usize, x: usize, y: usize) -> Self {
        Source { pixels, pitch, x, y }
    }

    fn row(&self, row: usize) -> usize {
        (self.y + row) * self.pitch
    }
}

/// Write window into a pixel buffer.
#[derive(Debug)]
pub struct Target<'a> {
    pub pixels: &'a mut [u8],
    pub pitch: usize,
    pub x: usize,
    pub y: usize,
}

impl<'a> Target<'a> {
    pub fn new(pixels: &'a mut [u8], pitch: usize, x: usize, y: usize) -> Self {
        Target { pixels, pitch, x, y }
    }

    fn row(&self, row: usize) -> usize {
        (self.y + row) * self.pitch + self.x
    }
}

pub fn blit_raw(dst: Target<'_>, src: Source<'_>, width: usize, height: usize) {
    for row in 0..height {
        let d = dst.row(row);
        let s = src.row(row) + src.x;
        dst.pixels[d..d + width].copy_from_slice(&src.pixels[s..s + width]);
    }
}

pub fn blit_raw_color_key(dst: Target<'_>, src: Source<'_>, width: usize, height: usize) {
    for row in 0..height {
        let d = dst.row(row);
        let s = src.row(row) + src.x;
        for (out, &value) in dst.pixels[d..d + width]
            .iter_mut()
            .zip(&src.pixels[s..s + width])
        {
            if value != 0 {
                *out = value;
            }
        }
    }
}

/// Reads each source row right to left starting at column `src.x`.
pub fn blit_mirrored(dst: Target<'_>, src: Source<'_>, width: usize, height: usize) {
    for row in 0..height {
        let d = dst.row(row);
        let s = src.row(row);
        for col in 0..width {
            dst.pixels[d + col] = src.pixels[s + src.x - col];
        }
    }
}

pub fn blit_mirrored_color_key(dst: Target<'_>, src: Source<'_>, width: usize, height: usize) {
    for row in 0..height {
        let d = dst.row(row);
        let s = src.row(row);
        for col in 0..width {
            let value = src.pixels[s + src.x - col];
            if value != 0 {
                dst.pixels[d + col] = value;
            }
        }
    }
}

pub fn blit_trans_table(
    dst: Target<'_>,
    src: Source<'_>,
    width: usize,
    height: usize,
    table: &TransTable,
) {
    for row in 0..height {
        let d = dst.row(row);
        let s = src.row(row) + src.x;
        for col in 0..width {
            let value = src.pixels[s + col];
            if value != 0 {
                let out = &mut dst.pixels[d + col];
                *out = table.blend(value, *out);
            }
        }
    }
}

pub fn blit_trans_table_mirrored(
    dst: Target<'_>,
    src: Source<'_>,
    width: usize,
    height: usize,
    table: &TransTable,
) {
    for row in 0..height {
        let d = dst.row(row);
        let s = src.row(row);
        for col in 0..width {
            let value = src.pixels[s + src.x - col];
            if value != 0 {
                let out = &mut dst.pixels[d + col];
                *out = table.blend(value, *out);
            }
        }
    }
}

/// Blends the source against a background image instead of the current
/// destination contents.
pub fn blit_crossfade(
    dst: Target<'_>,
    src: Source<'_>,
    background: Source<'_>,
    width: usize,
    height: usize,
    table: &TransTable,
) {
    for row in 0..height {
        let d = dst.row(row);
        let s = src.row(row) + src.x;
        let b = background.row(row) + background.x;
        for col in 0..width {
            let value = src.pixels[s + col];
            if value != 0 {
                dst.pixels[d + col] = table.blend(value, background.pixels[b + col]);
            }
        }
    }
}
