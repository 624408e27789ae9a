pub mod action_list;
pub mod actor_record;
pub mod object_record;
pub mod resource;

pub use action_list::{
    ACTION_COMMAND_SIZE, ActionListFile, ActionListPack, MAX_ACTION_COMMANDS, SCRIPT_RECORD_SIZE,
    ScriptCommand, ScriptRecord,
};
pub use actor_record::{ACTOR_GRAPHIC_SLOTS, ACTOR_RECORD_SIZE, ActorRecord};
pub use object_record::{
    FrameSoundItem, OBJECT_FRAME_SOUND_ITEMS, OBJECT_GAME_FLAGS, OBJECT_RECORD_SIZE,
    OBJECT_SOUND_ITEMS, ObjectRecord, SoundItem,
};
pub use resource::{
    GraphicFrame, GraphicResource, MaskData, PaletteData, RecordRect, ResourceId, TransTable,
    make_resource, resource_index, resource_pack,
};
