//! Boundary to the host's resource packs.
//!
//! The engine asks for decoded payloads by id and never touches the pack
//! container. `InMemoryResources` backs the headless runner and the tests; it
//! can be filled programmatically or from a small JSON manifest.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use asylum_formats::{
    make_resource, GraphicFrame, GraphicResource, MaskData, PaletteData, ResourceId, TransTable,
};
use serde::{Deserialize, Serialize};

pub const PACK_SHARED: u32 = 1;
pub const PACK_MUSIC: u32 = 2;
pub const PACK_SPEECH: u32 = 3;
pub const PACK_SOUND: u32 = 4;

/// Scene packs follow the shared ones: scene `n` lives in pack `n + 4`.
pub const SCENE_PACK_OFFSET: i32 = 4;

/// What a speech opcode asks the speech collaborator to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeechRequest {
    /// Line `index` of the current chapter's indexed speech table.
    Indexed { index: i32 },
    /// Player-specific line.
    Player { index: i32 },
    /// Scene line of a given type.
    Scene { kind: i32, index: i32 },
}

/// Sound and subtitle text resolved for a speech request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechLine {
    pub sound: ResourceId,
    pub text: ResourceId,
}

impl SpeechLine {
    /// Fixed line used by the ambient speech opcode: sound `515 + n` in the
    /// speech pack, text `1290 + n` in the shared pack.
    pub fn ambient(index: i32) -> Self {
        SpeechLine {
            sound: make_resource(PACK_SPEECH, (515 + index) as u32),
            text: make_resource(PACK_SHARED, (1290 + index) as u32),
        }
    }
}

pub trait ResourceProvider {
    fn graphic(&self, id: ResourceId) -> Option<&GraphicResource>;
    fn palette(&self, id: ResourceId) -> Option<&PaletteData>;
    fn mask(&self, id: ResourceId) -> Option<&MaskData>;
    fn trans_table(&self, id: ResourceId) -> Option<&TransTable>;
    fn speech(&self, request: SpeechRequest) -> Option<SpeechLine>;

    fn frame_count(&self, id: ResourceId) -> Option<u32> {
        self.graphic(id).map(|resource| resource.frame_count() as u32)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryResources {
    graphics: HashMap<ResourceId, GraphicResource>,
    palettes: HashMap<ResourceId, PaletteData>,
    masks: HashMap<ResourceId, MaskData>,
    trans_tables: HashMap<ResourceId, TransTable>,
    speech: HashMap<SpeechRequest, SpeechLine>,
}

impl InMemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_graphic(&mut self, id: ResourceId, resource: GraphicResource) {
        self.graphics.insert(id, resource);
    }

    pub fn insert_palette(&mut self, id: ResourceId, palette: PaletteData) {
        self.palettes.insert(id, palette);
    }

    pub fn insert_mask(&mut self, id: ResourceId, mask: MaskData) {
        self.masks.insert(id, mask);
    }

    pub fn insert_trans_table(&mut self, id: ResourceId, table: TransTable) {
        self.trans_tables.insert(id, table);
    }

    pub fn insert_speech(&mut self, request: SpeechRequest, line: SpeechLine) {
        self.speech.insert(request, line);
    }

    pub fn graphic_count(&self) -> usize {
        self.graphics.len()
    }

    /// Loads a manifest of synthetic resources; no path means an empty set.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let mut resources = InMemoryResources::new();
        let Some(path) = path else {
            return Ok(resources);
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read resource manifest: {}", path.display()))?;
        let manifest: ResourceManifest = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse resource manifest: {}", path.display()))?;
        resources
            .extend_from_manifest(manifest)
            .with_context(|| format!("building resources from {}", path.display()))?;
        Ok(resources)
    }

    fn extend_from_manifest(&mut self, manifest: ResourceManifest) -> Result<()> {
        for entry in manifest.graphics {
            let mut frames = Vec::with_capacity(entry.frames.len());
            for (index, frame) in entry.frames.into_iter().enumerate() {
                let pixels = match frame.pixels {
                    Some(pixels) => pixels,
                    None => vec![frame.color; frame.width as usize * frame.height as usize],
                };
                frames.push(
                    GraphicFrame::new(frame.x, frame.y, frame.width, frame.height, pixels)
                        .with_context(|| format!("graphic {:#010x} frame {index}", entry.id))?,
                );
            }
            let mut resource = GraphicResource::new(frames);
            resource.flags = entry.flags;
            self.insert_graphic(entry.id, resource);
        }
        for entry in manifest.palettes {
            self.insert_palette(entry.id, PaletteData::from_entries(entry.start, entry.entries));
        }
        for entry in manifest.speech {
            self.insert_speech(entry.request, entry.line);
        }
        Ok(())
    }
}

impl ResourceProvider for InMemoryResources {
    fn graphic(&self, id: ResourceId) -> Option<&GraphicResource> {
        self.graphics.get(&id)
    }

    fn palette(&self, id: ResourceId) -> Option<&PaletteData> {
        self.palettes.get(&id)
    }

    fn mask(&self, id: ResourceId) -> Option<&MaskData> {
        self.masks.get(&id)
    }

    fn trans_table(&self, id: ResourceId) -> Option<&TransTable> {
        self.trans_tables.get(&id)
    }

    fn speech(&self, request: SpeechRequest) -> Option<SpeechLine> {
        self.speech.get(&request).copied()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceManifest {
    graphics: Vec<GraphicEntry>,
    palettes: Vec<PaletteEntry>,
    speech: Vec<SpeechEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphicEntry {
    id: ResourceId,
    #[serde(default)]
    flags: u32,
    frames: Vec<FrameEntry>,
}

#[derive(Debug, Deserialize)]
struct FrameEntry {
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    width: u16,
    height: u16,
    #[serde(default)]
    color: u8,
    pixels: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize)]
struct PaletteEntry {
    id: ResourceId,
    #[serde(default)]
    start: u8,
    entries: Vec<[u8; 3]>,
}

#[derive(Debug, Deserialize)]
struct SpeechEntry {
    request: SpeechRequest,
    line: SpeechLine,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn manifest_builds_graphics_palettes_and_speech() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resources.json");
        let graphic_id = make_resource(5, 2);
        let palette_id = make_resource(5, 3);
        fs::write(
            &path,
            format!(
                r#"{{
                    "graphics": [{{ "id": {graphic_id}, "frames": [
                        {{ "width": 2, "height": 2, "color": 9 }},
                        {{ "width": 1, "height": 1, "pixels": [4] }}
                    ] }}],
                    "palettes": [{{ "id": {palette_id}, "start": 1, "entries": [[63, 0, 0]] }}],
                    "speech": [{{
                        "request": {{ "type": "indexed", "index": 1 }},
                        "line": {{ "sound": 11, "text": 12 }}
                    }}, {{
                        "request": {{ "type": "scene", "kind": 3, "index": 9 }},
                        "line": {{ "sound": 21, "text": 22 }}
                    }}]
                }}"#
            ),
        )
        .unwrap();

        let resources = InMemoryResources::from_json_file(Some(&path)).unwrap();
        let graphic = resources.graphic(graphic_id).unwrap();
        assert_eq!(graphic.frame_count(), 2);
        assert_eq!(graphic.frames[0].pixels, vec![9; 4]);
        assert_eq!(resources.frame_count(graphic_id), Some(2));
        assert_eq!(resources.palette(palette_id).unwrap().start, 1);
        assert_eq!(
            resources.speech(SpeechRequest::Indexed { index: 1 }),
            Some(SpeechLine { sound: 11, text: 12 })
        );
        assert_eq!(
            resources.speech(SpeechRequest::Scene { kind: 3, index: 9 }),
            Some(SpeechLine { sound: 21, text: 22 })
        );
        assert!(resources.speech(SpeechRequest::Player { index: 1 }).is_none());
    }

    #[test]
    fn scene_speech_request_keeps_its_kind_field() {
        let request = SpeechRequest::Scene { kind: 4, index: 2 };
        let json = serde_json::to_value(request).unwrap();
        assert_eq!(json["type"], "scene");
        assert_eq!(json["kind"], 4);
        let back: SpeechRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn bad_frame_size_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resources.json");
        fs::write(
            &path,
            r#"{ "graphics": [{ "id": 1, "frames": [{ "width": 2, "height": 2, "pixels": [1] }] }] }"#,
        )
        .unwrap();
        let err = InMemoryResources::from_json_file(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("frame 0"));
    }

    #[test]
    fn ambient_speech_line_ids() {
        let line = SpeechLine::ambient(2);
        assert_eq!(line.sound, make_resource(PACK_SPEECH, 517));
        assert_eq!(line.text, make_resource(PACK_SHARED, 1292));
    }
}
