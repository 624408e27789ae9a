//! The opcode catalog: id, name and handler of every action-list
//! instruction.

use asylum_formats::ScriptCommand;

use crate::error::ContentResult;

use super::command::{Control, OpContext};
use super::ops::{actor, flags, flow, object, scene, sound};

pub type Handler = fn(&mut OpContext<'_>, &ScriptCommand) -> ContentResult<Control>;

#[derive(Clone, Copy)]
pub struct Opcode {
    pub id: i32,
    pub name: &'static str,
    pub handler: Handler,
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x} {}", self.id, self.name)
    }
}

/// Number of opcodes; ids run from zero without gaps.
pub const OPCODE_COUNT: usize = 100;

/// Opcode whose line a checked jump may land on.
pub const fn is_return(opcode: i32) -> bool {
    matches!(opcode, 0x00 | 0x10)
}

macro_rules! catalog {
    ($($id:literal => $name:literal, $handler:path;)*) => {
        pub const OPCODES: [Opcode; OPCODE_COUNT] = [
            $(Opcode { id: $id, name: $name, handler: $handler },)*
        ];
    };
}

catalog! {
    0x00 => "Return", flow::finish;
    0x01 => "SetGameFlag", flags::set_game_flag;
    0x02 => "ClearGameFlag", flags::clear_game_flag;
    0x03 => "ToggleGameFlag", flags::toggle_game_flag;
    0x04 => "JumpIfGameFlag", flags::jump_if_game_flag;
    0x05 => "HideCursor", scene::hide_cursor;
    0x06 => "ShowCursor", scene::show_cursor;
    0x07 => "PlayAnimation", object::play_animation;
    0x08 => "MoveScenePosition", scene::move_scene_position;
    0x09 => "HideActor", actor::hide_actor;
    0x0A => "ShowActor", actor::show_actor;
    0x0B => "SetActorPosition", actor::set_actor_position;
    0x0C => "SetSceneMotionStatus", scene::set_scene_motion_status;
    0x0D => "DisableActor", actor::disable_actor;
    0x0E => "EnableActor", actor::enable_actor;
    0x0F => "EnableObjects", object::enable_objects;
    0x10 => "Return", flow::finish;
    0x11 => "RemoveObject", object::remove_object;
    0x12 => "JumpActorSpeech", actor::jump_actor_speech;
    0x13 => "JumpAndSetDirection", actor::jump_and_set_direction;
    0x14 => "JumpIfActorCoordinates", actor::jump_if_actor_coordinates;
    0x15 => "Nop", flow::nop;
    0x16 => "ResetAnimation", object::reset_animation;
    0x17 => "DisableObject", object::disable_object;
    0x18 => "JumpIfSoundPlayingAndPlaySound", sound::play_sound_and_wait;
    0x19 => "JumpIfActionFind", flags::jump_if_action_find;
    0x1A => "SetActionFind", flags::set_action_find;
    0x1B => "ClearActionFind", flags::clear_action_find;
    0x1C => "JumpIfActionGrab", flags::jump_if_action_grab;
    0x1D => "SetActionGrab", flags::set_action_grab;
    0x1E => "ClearActionGrab", flags::clear_action_grab;
    0x1F => "JumpIfActionTalk", flags::jump_if_action_talk;
    0x20 => "SetActionTalk", flags::set_action_talk;
    0x21 => "ClearActionTalk", flags::clear_action_talk;
    0x22 => "AddReactionHive", actor::add_reaction_hive;
    0x23 => "RemoveReactionHive", actor::remove_reaction_hive;
    0x24 => "JumpIfReactionHive", actor::jump_if_reaction_hive;
    0x25 => "RunEncounter", scene::run_encounter;
    0x26 => "JumpIfAction16", flags::jump_if_action16;
    0x27 => "SetAction16", flags::set_action16;
    0x28 => "ClearAction16", flags::clear_action16;
    0x29 => "SetActorScriptFlag", actor::set_actor_script_flag;
    0x2A => "JumpIfActorScriptFlag", actor::jump_if_actor_script_flag;
    0x2B => "ChangeScene", scene::change_scene;
    0x2C => "PlayActorInteraction", actor::play_actor_interaction;
    0x2D => "PlayMovie", scene::play_movie;
    0x2E => "StopAllObjectsSounds", object::stop_all_objects_sounds;
    0x2F => "StopProcessing", flow::stop_processing;
    0x30 => "ResumeProcessing", flow::resume_processing;
    0x31 => "ResetSceneRect", scene::reset_scene_rect;
    0x32 => "ChangeMusicById", sound::change_music_by_id;
    0x33 => "StopMusic", sound::stop_music;
    0x34 => "WaitCycles", flow::wait_cycles;
    0x35 => "SetVolume", sound::set_volume;
    0x36 => "Jump", flow::jump;
    0x37 => "RunBlowUpPuzzle", scene::run_blow_up_puzzle;
    0x38 => "JumpIfAction8", flags::jump_if_action8;
    0x39 => "SetAction8", flags::set_action8;
    0x3A => "ClearAction8", flags::clear_action8;
    0x3B => "GreyPaletteTransition", scene::grey_palette_transition;
    0x3C => "CountLoop", flow::count_loop;
    0x3D => "WaitUntilFramePlayed", object::wait_until_frame_played;
    0x3E => "UpdateWideScreen", scene::update_wide_screen;
    0x3F => "JumpIfActor", actor::jump_if_actor;
    0x40 => "PlaySpeechScene", sound::play_speech_scene;
    0x41 => "PlaySpeech", sound::play_speech;
    0x42 => "PlaySpeechScene2", sound::play_speech_scene2;
    0x43 => "MoveScenePositionFromActor", scene::move_scene_position_from_actor;
    0x44 => "PaletteFade", scene::palette_fade;
    0x45 => "StartPaletteFade", scene::start_palette_fade;
    0x46 => "PlayAmbientSpeech", sound::play_ambient_speech;
    0x47 => "ActorFaceTarget", actor::actor_face_target;
    0x48 => "OpenMatteBars", scene::open_matte_bars;
    0x49 => "OpenMatteBarsWithSound", scene::open_matte_bars_with_sound;
    0x4A => "JumpIfSoundPlaying", sound::jump_if_sound_playing;
    0x4B => "ChangePlayerActorIndex", actor::change_player_actor_index;
    0x4C => "ChangeActorStatus", actor::change_actor_status;
    0x4D => "StopSound", sound::stop_sound;
    0x4E => "JumpRandom", flow::jump_random;
    0x4F => "ClearScreen", scene::clear_screen;
    0x50 => "Quit", scene::quit;
    0x51 => "JumpObjectFrame", object::jump_object_frame;
    0x52 => "DeleteGraphics", actor::delete_graphics;
    0x53 => "SetActorUpdateMode", actor::set_actor_update_mode;
    0x54 => "SetScriptValue", flow::set_script_value;
    0x55 => "JumpIfScriptValue", flow::jump_if_script_value;
    0x56 => "WalkToActor", actor::walk_to_actor;
    0x57 => "SetResourcePalette", scene::set_resource_palette;
    0x58 => "SetObjectFrameIndexAndFlags", object::set_object_frame_index_and_flags;
    0x59 => "StopObjectAnimation", object::stop_object_animation;
    0x5A => "SetActorActionIndex2", actor::set_actor_action_index2;
    0x5B => "SetTransparency", object::set_transparency;
    0x5C => "QueueScript", flow::queue_script;
    0x5D => "SetActorBehaviour", actor::set_actor_behaviour;
    0x5E => "ClearActorBehaviour", actor::clear_actor_behaviour;
    0x5F => "WaitObjectLastFrame", object::wait_object_last_frame;
    0x60 => "SetActionAreaFlags", flags::set_action_area_flags;
    0x61 => "ChangePlayer", actor::change_player;
    0x62 => "ShowOptionsScreen", scene::show_options_screen;
    0x63 => "WaitForSpeech", sound::wait_for_speech;
}

pub fn lookup(opcode: i32) -> Option<&'static Opcode> {
    usize::try_from(opcode).ok().and_then(|index| OPCODES.get(index))
}

/// Name for logs; unknown ids render as `Unknown`.
pub fn name(opcode: i32) -> &'static str {
    lookup(opcode).map_or("Unknown", |op| op.name)
}
