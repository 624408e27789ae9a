use std::io::{Cursor, Read, Seek, SeekFrom};

use anyhow::{Context, Result, ensure};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use crate::resource::{RecordRect, ResourceId};

pub const ACTOR_RECORD_SIZE: usize = 0x9D8;
/// Direction/status buckets of five entries each.
pub const ACTOR_GRAPHIC_SLOTS: usize = 55;
pub const ACTOR_REACTIONS: usize = 8;
const ACTOR_NAME_SIZE: usize = 256;

/// Fixed-size actor entry of a scene's world data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorRecord {
    pub x: i32,
    pub y: i32,
    pub resource_id: ResourceId,
    pub frame_index: i32,
    pub frame_count: i32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub bounding_rect: RecordRect,
    pub direction: i32,
    pub status: i32,
    pub priority: i32,
    pub flags: i32,
    pub action_index3: i32,
    pub reactions: [i32; ACTOR_REACTIONS],
    pub marker: i32,
    pub walking_sounds: [ResourceId; 4],
    #[serde(skip)]
    pub graphic_resource_ids: [ResourceId; ACTOR_GRAPHIC_SLOTS],
    pub name: String,
    pub action_index2: i32,
    pub tick_value: i32,
    pub action_type: i32,
    pub sound_resource_id: ResourceId,
    pub number_value01: i32,
    pub update_mode: i32,
    pub attenuation: i32,
    pub transparency: i32,
    pub action_index1: i32,
}

impl ActorRecord {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= ACTOR_RECORD_SIZE,
            "actor record holds {} bytes, expected {ACTOR_RECORD_SIZE}",
            bytes.len()
        );
        let mut cursor = Cursor::new(bytes);

        let x = cursor_read(&mut cursor)?;
        let y = cursor_read(&mut cursor)?;
        let resource_id = cursor_read(&mut cursor)?;
        let _ = cursor_read(&mut cursor)?;
        let frame_index = cursor_read(&mut cursor)?;
        let frame_count = cursor_read(&mut cursor)?;
        let x1 = cursor_read(&mut cursor)?;
        let y1 = cursor_read(&mut cursor)?;
        let x2 = cursor_read(&mut cursor)?;
        let y2 = cursor_read(&mut cursor)?;

        let rect = RecordRect::read(&mut cursor)?;
        let bounding_rect = RecordRect {
            left: rect.left & 0xFFFF,
            top: rect.top & 0xFFFF,
            right: rect.right & 0xFFFF,
            bottom: rect.bottom & 0xFFFF,
        };

        let direction = cursor_read(&mut cursor)?;
        cursor_read(&mut cursor)?;
        let status = cursor_read(&mut cursor)?;
        cursor_read(&mut cursor)?;
        let priority = cursor_read(&mut cursor)?;
        let flags = cursor_read(&mut cursor)?;
        for _ in 0..5 {
            cursor_read(&mut cursor)?;
        }
        let action_index3 = cursor_read(&mut cursor)?;

        cursor.seek(SeekFrom::Current(0x5B0))?;

        let mut reactions = [0; ACTOR_REACTIONS];
        cursor.read_i32_into::<LittleEndian>(&mut reactions)?;
        let marker = cursor_read(&mut cursor)?;
        let mut walking_sounds = [0; 4];
        cursor.read_i32_into::<LittleEndian>(&mut walking_sounds)?;
        cursor_read(&mut cursor)?;
        cursor_read(&mut cursor)?;

        let mut graphic_resource_ids = [0; ACTOR_GRAPHIC_SLOTS];
        cursor
            .read_i32_into::<LittleEndian>(&mut graphic_resource_ids)
            .context("reading actor graphic table")?;

        let mut name_bytes = [0u8; ACTOR_NAME_SIZE];
        cursor.read_exact(&mut name_bytes)?;
        let name_len = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(ACTOR_NAME_SIZE);
        let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

        // three tables of 20 unused values
        cursor.seek(SeekFrom::Current(3 * 20 * 4))?;

        let action_index2 = cursor_read(&mut cursor)?;
        cursor_read(&mut cursor)?;
        let tick_value = cursor_read(&mut cursor)?;
        cursor_read(&mut cursor)?;
        let action_type = cursor_read(&mut cursor)?;
        cursor_read(&mut cursor)?;
        cursor_read(&mut cursor)?;
        let sound_resource_id = cursor_read(&mut cursor)?;
        let number_value01 = cursor_read(&mut cursor)?;
        let update_mode = cursor_read(&mut cursor)?;
        // remaining number display fields and the 8-byte number string
        cursor.seek(SeekFrom::Current(6 * 4 + 8))?;
        cursor_read(&mut cursor)?;
        let attenuation = cursor_read(&mut cursor)?;
        let transparency = cursor_read(&mut cursor)?;
        for _ in 0..3 {
            cursor_read(&mut cursor)?;
        }
        let action_index1 = cursor_read(&mut cursor)?;

        Ok(ActorRecord {
            x,
            y,
            resource_id,
            frame_index,
            frame_count,
            x1,
            y1,
            x2,
            y2,
            bounding_rect,
            direction,
            status,
            priority,
            flags,
            action_index3,
            reactions,
            marker,
            walking_sounds,
            graphic_resource_ids,
            name,
            action_index2,
            tick_value,
            action_type,
            sound_resource_id,
            number_value01,
            update_mode,
            attenuation,
            transparency,
            action_index1,
        })
    }

    /// Parses a count-prefixed (`i32`) run of records.
    pub fn parse_table(bytes: &[u8]) -> Result<Vec<Self>> {
        parse_counted(bytes, ACTOR_RECORD_SIZE, "actor", Self::parse)
    }
}

fn cursor_read(cursor: &mut Cursor<&[u8]>) -> Result<i32> {
    Ok(cursor.read_i32::<LittleEndian>()?)
}

pub(crate) fn parse_counted<T>(
    bytes: &[u8],
    record_size: usize,
    kind: &str,
    parse: impl Fn(&[u8]) -> Result<T>,
) -> Result<Vec<T>> {
    ensure!(bytes.len() >= 4, "{kind} table is missing its count");
    let count = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    ensure!(count >= 0, "{kind} table declares negative count {count}");
    let count = count as usize;
    ensure!(
        bytes.len() >= 4 + count * record_size,
        "{kind} table truncated: {count} records need {} bytes",
        4 + count * record_size
    );
    (0..count)
        .map(|index| {
            let start = 4 + index * record_size;
            parse(&bytes[start..start + record_size])
                .with_context(|| format!("parsing {kind} record {index}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(buffer: &mut [u8], offset: usize, value: i32) {
        buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn parses_fields_at_record_offsets() {
        let mut data = vec![0u8; ACTOR_RECORD_SIZE];
        put(&mut data, 0x00, 12);
        put(&mut data, 0x18, 100);
        put(&mut data, 0x20, 20);
        put(&mut data, 0x28, 0x1_0005);
        put(&mut data, 0x38, 6);
        put(&mut data, 0x40, 4);
        put(&mut data, 0x4C, 1);
        put(&mut data, 0x618, 3);
        put(&mut data, 0x638, 9);
        put(&mut data, 0x654, -1);
        put(&mut data, 0x654 + 54 * 4, -55);
        data[0x730..0x735].copy_from_slice(b"Max\0\0");
        put(&mut data, 0x93C, -7);
        put(&mut data, 0x944, 5);
        put(&mut data, 0x96C, 40);
        put(&mut data, 0x970, 2);

        let record = ActorRecord::parse(&data).unwrap();
        assert_eq!(record.x, 12);
        assert_eq!(record.x1, 100);
        assert_eq!(record.x2, 20);
        assert_eq!(record.bounding_rect.left, 5);
        assert_eq!(record.direction, 6);
        assert_eq!(record.status, 4);
        assert_eq!(record.flags, 1);
        assert_eq!(record.reactions[0], 3);
        assert_eq!(record.marker, 9);
        assert_eq!(record.graphic_resource_ids[0], -1);
        assert_eq!(record.graphic_resource_ids[54], -55);
        assert_eq!(record.name, "Max");
        assert_eq!(record.sound_resource_id, -7);
        assert_eq!(record.update_mode, 5);
        assert_eq!(record.attenuation, 40);
        assert_eq!(record.transparency, 2);
    }

    #[test]
    fn parses_counted_table() {
        let mut data = 2i32.to_le_bytes().to_vec();
        data.extend(vec![0u8; 2 * ACTOR_RECORD_SIZE]);
        assert_eq!(ActorRecord::parse_table(&data).unwrap().len(), 2);
        data.truncate(data.len() - 1);
        assert!(ActorRecord::parse_table(&data).is_err());
    }
}
