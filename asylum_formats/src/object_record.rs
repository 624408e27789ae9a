use std::io::{Cursor, Read};

use anyhow::{Context, Result, ensure};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use crate::actor_record::parse_counted;
use crate::resource::{RecordRect, ResourceId};

pub const OBJECT_RECORD_SIZE: usize = 0x6A8;
pub const OBJECT_GAME_FLAGS: usize = 10;
pub const OBJECT_SOUND_ITEMS: usize = 16;
pub const OBJECT_FRAME_SOUND_ITEMS: usize = 50;
pub const OBJECT_RANDOM_RESOURCES: usize = 5;
const OBJECT_NAME_SIZE: usize = 52;

/// Ambient sound slot attached to an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SoundItem {
    pub resource_id: ResourceId,
    pub looping: i32,
    pub attenuation: i32,
    pub delta: i32,
}

/// Sound fired when the object's animation reaches `frame_index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameSoundItem {
    pub resource_id: ResourceId,
    pub frame_index: i32,
    pub index: i32,
    pub attenuation: i32,
    pub delta: i32,
    pub flags: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRecord {
    pub id: i32,
    pub resource_id: ResourceId,
    pub x: i32,
    pub y: i32,
    pub bounding_rect: RecordRect,
    pub frame_index: u32,
    pub frame_count: u32,
    pub flags: u32,
    pub activity: i32,
    pub name: String,
    pub rect: RecordRect,
    pub polygon_index: i32,
    pub action_type: i32,
    pub game_flags: [i32; OBJECT_GAME_FLAGS],
    pub fps: i32,
    pub tick_count: u32,
    pub random_interval: u32,
    pub random_chance: u32,
    pub priority: i32,
    pub script_index: i32,
    pub sound_items: [SoundItem; OBJECT_SOUND_ITEMS],
    #[serde(skip)]
    pub frame_sound_items: [FrameSoundItem; OBJECT_FRAME_SOUND_ITEMS],
    pub transparency: i32,
    pub sound_x: i32,
    pub sound_y: i32,
    pub tracks_camera: i32,
    pub random_resource_ids: [ResourceId; OBJECT_RANDOM_RESOURCES],
    pub sound_resource_id: ResourceId,
    pub attenuation: i32,
}

impl ObjectRecord {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= OBJECT_RECORD_SIZE,
            "object record holds {} bytes, expected {OBJECT_RECORD_SIZE}",
            bytes.len()
        );
        let mut cursor = Cursor::new(bytes);

        let id = cursor.read_i32::<LittleEndian>()?;
        let resource_id = cursor.read_i32::<LittleEndian>()?;
        let x = cursor.read_i32::<LittleEndian>()?;
        let y = cursor.read_i32::<LittleEndian>()?;
        let raw = RecordRect::read(&mut cursor)?;
        let bounding_rect = RecordRect {
            left: (raw.left & 0xFFFF) as i16 as i32,
            top: (raw.top & 0xFFFF) as i16 as i32,
            right: (raw.right & 0xFFFF) as i16 as i32,
            bottom: (raw.bottom & 0xFFFF) as i16 as i32,
        };
        cursor.read_i32::<LittleEndian>()?;
        let frame_index = cursor.read_u32::<LittleEndian>()?;
        let frame_count = cursor.read_u32::<LittleEndian>()?;
        for _ in 0..3 {
            cursor.read_i32::<LittleEndian>()?;
        }
        let flags = cursor.read_u32::<LittleEndian>()?;
        let activity = cursor.read_i32::<LittleEndian>()?;

        let mut name_bytes = [0u8; OBJECT_NAME_SIZE];
        cursor.read_exact(&mut name_bytes)?;
        let name_len = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(OBJECT_NAME_SIZE);
        let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

        let raw = RecordRect::read(&mut cursor)?;
        let rect = RecordRect {
            left: raw.left as i16 as i32,
            top: raw.top as i16 as i32,
            right: raw.right as i16 as i32,
            bottom: raw.bottom as i16 as i32,
        };
        let polygon_index = cursor.read_i32::<LittleEndian>()?;
        let action_type = cursor.read_i32::<LittleEndian>()?;
        let mut game_flags = [0; OBJECT_GAME_FLAGS];
        cursor.read_i32_into::<LittleEndian>(&mut game_flags)?;

        let fps = cursor.read_i32::<LittleEndian>()?;
        let tick_count = cursor.read_u32::<LittleEndian>()?;
        let random_interval = cursor.read_u32::<LittleEndian>()?;
        let random_chance = cursor.read_u32::<LittleEndian>()?;
        let priority = cursor.read_i32::<LittleEndian>()?;
        let script_index = cursor.read_i32::<LittleEndian>()?;

        let mut sound_items = [SoundItem::default(); OBJECT_SOUND_ITEMS];
        for item in sound_items.iter_mut() {
            let mut raw = [0; 4];
            cursor.read_i32_into::<LittleEndian>(&mut raw)?;
            *item = SoundItem {
                resource_id: raw[0],
                looping: raw[1],
                attenuation: raw[2],
                delta: raw[3],
            };
        }

        let mut frame_sound_items = [FrameSoundItem::default(); OBJECT_FRAME_SOUND_ITEMS];
        for (index, item) in frame_sound_items.iter_mut().enumerate() {
            let mut raw = [0; 6];
            cursor
                .read_i32_into::<LittleEndian>(&mut raw)
                .with_context(|| format!("reading frame sound {index}"))?;
            *item = FrameSoundItem {
                resource_id: raw[0],
                frame_index: raw[1],
                index: raw[2],
                attenuation: raw[3],
                delta: raw[4],
                flags: raw[5],
            };
        }

        let transparency = cursor.read_i32::<LittleEndian>()?;
        let sound_x = cursor.read_i32::<LittleEndian>()?;
        let sound_y = cursor.read_i32::<LittleEndian>()?;
        let tracks_camera = cursor.read_i32::<LittleEndian>()?;
        let mut random_resource_ids = [0; OBJECT_RANDOM_RESOURCES];
        cursor.read_i32_into::<LittleEndian>(&mut random_resource_ids)?;
        let sound_resource_id = cursor.read_i32::<LittleEndian>()?;
        let attenuation = cursor.read_i32::<LittleEndian>()?;

        Ok(ObjectRecord {
            id,
            resource_id,
            x,
            y,
            bounding_rect,
            frame_index,
            frame_count,
            flags,
            activity,
            name,
            rect,
            polygon_index,
            action_type,
            game_flags,
            fps,
            tick_count,
            random_interval,
            random_chance,
            priority,
            script_index,
            sound_items,
            frame_sound_items,
            transparency,
            sound_x,
            sound_y,
            tracks_camera,
            random_resource_ids,
            sound_resource_id,
            attenuation,
        })
    }

    pub fn parse_table(bytes: &[u8]) -> Result<Vec<Self>> {
        parse_counted(bytes, OBJECT_RECORD_SIZE, "object", Self::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(buffer: &mut [u8], offset: usize, value: i32) {
        buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn parses_fields_at_record_offsets() {
        let mut data = vec![0u8; OBJECT_RECORD_SIZE];
        put(&mut data, 0x00, 1001);
        put(&mut data, 0x08, 320);
        put(&mut data, 0x10, 0xFFFF);
        put(&mut data, 0x28, 12);
        put(&mut data, 0x38, 0x21);
        put(&mut data, 0x3C, 4);
        data[0x40..0x45].copy_from_slice(b"Door\0");
        put(&mut data, 0x8C, -77);
        put(&mut data, 0xB4, 10);
        put(&mut data, 0xC4, 3);
        put(&mut data, 0xCC, -9);
        put(&mut data, 0xD0, 1);
        put(&mut data, 0x1CC, -11);
        put(&mut data, 0x1D0, 6);
        put(&mut data, 0x67C, 2);
        put(&mut data, 0x6A0, -5);
        put(&mut data, 0x6A4, 30);

        let record = ObjectRecord::parse(&data).unwrap();
        assert_eq!(record.id, 1001);
        assert_eq!(record.x, 320);
        assert_eq!(record.bounding_rect.left, -1);
        assert_eq!(record.frame_count, 12);
        assert_eq!(record.flags, 0x21);
        assert_eq!(record.activity, 4);
        assert_eq!(record.name, "Door");
        assert_eq!(record.game_flags[0], -77);
        assert_eq!(record.fps, 10);
        assert_eq!(record.priority, 3);
        assert_eq!(record.sound_items[0].resource_id, -9);
        assert_eq!(record.sound_items[0].looping, 1);
        assert_eq!(record.frame_sound_items[0].resource_id, -11);
        assert_eq!(record.frame_sound_items[0].frame_index, 6);
        assert_eq!(record.transparency, 2);
        assert_eq!(record.sound_resource_id, -5);
        assert_eq!(record.attenuation, 30);
    }
}
