//! Resource identifiers and the decoded payloads the engine core consumes.
//!
//! The pack container itself is owned by the host; these types are what a
//! resource provider hands over once an entry has been located and decoded.

use std::io::{Cursor, Read};

use anyhow::{Context, Result, ensure};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

/// Packed resource id: high bit set, pack number in bits 16..31, entry index
/// in the low 16 bits. Zero means "no resource".
pub type ResourceId = i32;

pub const RESOURCE_NONE: ResourceId = 0;

pub const fn make_resource(pack: u32, index: u32) -> ResourceId {
    (0x8000_0000 | ((pack & 0x7FFF) << 16) | (index & 0xFFFF)) as ResourceId
}

pub const fn resource_pack(id: ResourceId) -> u32 {
    ((id as u32) >> 16) & 0x7FFF
}

pub const fn resource_index(id: ResourceId) -> u32 {
    (id as u32) & 0xFFFF
}

/// Rectangle as stored in world records (`right`/`bottom` exclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RecordRect {
    pub fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(RecordRect {
            left: cursor.read_i32::<LittleEndian>()?,
            top: cursor.read_i32::<LittleEndian>()?,
            right: cursor.read_i32::<LittleEndian>()?,
            bottom: cursor.read_i32::<LittleEndian>()?,
        })
    }
}

/// One CLUT8 frame of a graphic resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicFrame {
    /// Offset of the frame inside the resource's bounding box.
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
    /// Row-major pixels, pitch equals `width`.
    pub pixels: Vec<u8>,
}

impl GraphicFrame {
    pub fn new(x: i32, y: i32, width: u16, height: u16, pixels: Vec<u8>) -> Result<Self> {
        ensure!(
            pixels.len() == width as usize * height as usize,
            "frame pixel buffer holds {} bytes, expected {}x{}",
            pixels.len(),
            width,
            height
        );
        Ok(GraphicFrame {
            x,
            y,
            width,
            height,
            pixels,
        })
    }

    /// Frame filled with a single palette index.
    pub fn solid(width: u16, height: u16, color: u8) -> Self {
        GraphicFrame {
            x: 0,
            y: 0,
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn pitch(&self) -> usize {
        self.width as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicResource {
    /// Low nibble >= 2 marks resources whose frames are anchored to the
    /// right edge when drawn mirrored.
    pub flags: u32,
    pub max_width: i32,
    pub frames: Vec<GraphicFrame>,
}

impl GraphicResource {
    pub fn new(frames: Vec<GraphicFrame>) -> Self {
        let max_width = frames
            .iter()
            .map(|frame| frame.x + frame.width as i32)
            .max()
            .unwrap_or(0);
        GraphicResource {
            flags: 0,
            max_width,
            frames,
        }
    }

    pub fn frame(&self, index: usize) -> Option<&GraphicFrame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn anchors_mirrored_frames(&self) -> bool {
        (self.flags & 15) >= 2
    }
}

/// Palette payload: `count` (i16), `start` (u8), one pad byte, then 6-bit RGB
/// triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteData {
    pub count: u16,
    pub start: u8,
    pub entries: Vec<[u8; 3]>,
}

impl PaletteData {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure!(bytes.len() >= 4, "palette payload too small for header");
        let mut cursor = Cursor::new(bytes);
        let count = cursor.read_i16::<LittleEndian>()?;
        let start = cursor.read_u8()?;
        cursor.read_u8()?;
        ensure!(count >= 0, "palette declares negative entry count {count}");
        ensure!(
            start as usize + count as usize <= 256,
            "palette entries {start}+{count} overflow 256 colors"
        );

        let available = (bytes.len() - 4) / 3;
        ensure!(
            available >= count as usize,
            "palette payload truncated: {available} of {count} entries"
        );

        let mut entries = Vec::with_capacity(available.min(256));
        for index in 0..available.min(256) {
            let mut rgb = [0u8; 3];
            cursor
                .read_exact(&mut rgb)
                .with_context(|| format!("reading palette entry {index}"))?;
            entries.push(rgb);
        }

        Ok(PaletteData {
            count: count as u16,
            start,
            entries,
        })
    }

    pub fn from_entries(start: u8, entries: Vec<[u8; 3]>) -> Self {
        PaletteData {
            count: entries.len() as u16,
            start,
            entries,
        }
    }
}

/// 1-bit mask, LSB first within each byte, rows padded to whole bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskData {
    pub width: u32,
    pub height: u32,
    pub bits: Vec<u8>,
}

impl MaskData {
    /// Layout: height (u32), width (u32), packed rows.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let height = cursor.read_u32::<LittleEndian>()?;
        let width = cursor.read_u32::<LittleEndian>()?;
        let stride = width.div_ceil(8) as usize;
        let needed = stride * height as usize;
        ensure!(
            bytes.len() >= 8 + needed,
            "mask payload truncated: {} bytes for {}x{}",
            bytes.len(),
            width,
            height
        );
        Ok(MaskData {
            width,
            height,
            bits: bytes[8..8 + needed].to_vec(),
        })
    }

    pub fn stride(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    /// True when the pixel is hidden by the mask.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.bits[y as usize * self.stride() + (x / 8) as usize];
        (byte >> (x % 8)) & 1 != 0
    }
}

pub const TRANSPARENCY_TABLE_SIZE: usize = 256 * 256;

/// Blend lookup indexed by `source << 8 | destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransTable {
    pub data: Vec<u8>,
}

impl TransTable {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= TRANSPARENCY_TABLE_SIZE,
            "transparency table holds {} bytes, expected {}",
            bytes.len(),
            TRANSPARENCY_TABLE_SIZE
        );
        Ok(TransTable {
            data: bytes[..TRANSPARENCY_TABLE_SIZE].to_vec(),
        })
    }

    pub fn blend(&self, source: u8, destination: u8) -> u8 {
        self.data[((source as usize) << 8) | destination as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_ids_pack_and_unpack() {
        let id = make_resource(5, 0x1234);
        assert!(id < 0);
        assert_eq!(resource_pack(id), 5);
        assert_eq!(resource_index(id), 0x1234);
    }

    #[test]
    fn parses_palette_header_and_entries() {
        let mut data = Vec::new();
        data.extend_from_slice(&2i16.to_le_bytes());
        data.push(10);
        data.push(0);
        data.extend_from_slice(&[1, 2, 3, 63, 62, 61]);
        let palette = PaletteData::parse(&data).unwrap();
        assert_eq!(palette.count, 2);
        assert_eq!(palette.start, 10);
        assert_eq!(palette.entries, vec![[1, 2, 3], [63, 62, 61]]);
    }

    #[test]
    fn rejects_palette_past_color_table() {
        let mut data = Vec::new();
        data.extend_from_slice(&4i16.to_le_bytes());
        data.push(254);
        data.push(0);
        data.extend_from_slice(&[0; 12]);
        assert!(PaletteData::parse(&data).is_err());
    }

    #[test]
    fn mask_bits_are_lsb_first() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&[0b0000_0101, 0b1000_0000]);
        let mask = MaskData::parse(&data).unwrap();
        assert!(mask.is_set(0, 0));
        assert!(!mask.is_set(1, 0));
        assert!(mask.is_set(2, 0));
        assert!(mask.is_set(15, 0));
        assert!(!mask.is_set(16, 0));
    }
}
