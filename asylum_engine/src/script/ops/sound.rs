//! Sound effects, music, ambient volume and speech lines.
//!
//! Blocking speech raises the frame's speech hold, which keeps idle
//! behaviour quiet until the line drains.

use asylum_formats::ScriptCommand;

use crate::actor::ActorStatus;
use crate::audio::isqrt;
use crate::config::VOLUME_SILENT;
use crate::error::{ContentError, ContentResult};
use crate::object::ObjectFlags;
use crate::resources::{SpeechLine, SpeechRequest};
use crate::script::command::{Control, OpContext};
use crate::world::{EngineFlags, SPEECH_GAME_FLAG};

const SPEECH_FLAGS: EngineFlags = EngineFlags::TYPE1.union(EngineFlags::TYPE2);

/// Plays sound `param1` unless it already plays; `param4` loops it, `param3`
/// lowers it. `param2 == 1` waits for the sound to end.
pub fn play_sound_and_wait(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let sound = cmd.param(1);
    if ctx.state.is_waiting() {
        if ctx.is_playing(sound) {
            return Ok(Control::Repeat);
        }
        ctx.state.complete();
        return Ok(Control::Advance);
    }

    if !ctx.is_playing(sound) {
        let level = cmd.param(3).abs() + isqrt(ctx.services.config.sfx_volume.abs());
        let volume = (-(level * level)).max(VOLUME_SILENT);
        ctx.services
            .mixer
            .play_sound(sound, cmd.param(4) != 0, volume, 0);
        if cmd.param(2) == 1 {
            ctx.state.wait();
            return Ok(Control::Repeat);
        }
    }
    Ok(Control::Advance)
}

pub fn change_music_by_id(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let volume = ctx.services.config.music_volume;
    ctx.services.mixer.change_music(cmd.param(1), volume);
    Ok(Control::Advance)
}

pub fn stop_music(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.services.mixer.stop_music();
    Ok(Control::Advance)
}

/// Re-levels ambient sound `param1` with the extra attenuation `param2`.
pub fn set_volume(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let index = cmd.param(1);
    let ambient = usize::try_from(index)
        .ok()
        .and_then(|index| ctx.scene.world.ambient_sounds.get(index))
        .copied()
        .ok_or(ContentError::InvalidParameter {
            opcode: "SetVolume",
            name: "param1",
            value: index,
        })?;

    let offset = i64::from(cmd.param(2) + ambient.delta);
    let config = &ctx.services.config;
    let volume = -((i64::from(config.sfx_volume) + offset) * (i64::from(config.ambient_volume) + offset));
    let volume = volume.clamp(i64::from(VOLUME_SILENT), 0) as i32;
    ctx.services.mixer.set_volume(ambient.resource_id, volume);
    Ok(Control::Advance)
}

/// Shared by the indexed and player speech opcodes. `param2` blocks until
/// the line ends, `param3` marks it as a conversation line and `param6`
/// seeds the latch that tells first and later runs apart.
fn speak(ctx: &mut OpContext<'_>, cmd: &ScriptCommand, request: SpeechRequest) -> ContentResult<Control> {
    let state = &mut *ctx.state;
    state.seed_with(|state| state.latch = cmd.param(6) != 0);

    if !state.is_waiting() {
        state.handle = ctx.services.play_speech(request).unwrap_or_default();
        let world = &mut ctx.scene.world;
        if cmd.param(3) != 0 && !state.latch {
            world.flags.set(SPEECH_GAME_FLAG);
        }
        if cmd.param(2) != 0 {
            ctx.frame.script_hold = true;
            state.wait();
            if state.latch {
                world.engine_flags.insert(SPEECH_FLAGS);
            }
            return Ok(Control::Repeat);
        }
        return Ok(Control::Advance);
    }

    if ctx.services.mixer.is_playing(state.handle) {
        return Ok(Control::Repeat);
    }
    ctx.frame.script_hold = false;
    state.complete();

    let world = &mut ctx.scene.world;
    if cmd.param(3) != 0 {
        if state.latch {
            world.engine_flags.remove(SPEECH_FLAGS);
            return Ok(Control::Advance);
        }
        world.flags.clear(SPEECH_GAME_FLAG);
    }
    if !state.latch {
        state.latch = true;
    } else {
        world.engine_flags.remove(SPEECH_FLAGS);
    }
    Ok(Control::Advance)
}

/// Line `param1` (0..5) of the indexed speech table.
pub fn play_speech_scene(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if !(0..5).contains(&cmd.param(1)) {
        return Ok(Control::Advance);
    }
    speak(ctx, cmd, SpeechRequest::Indexed { index: cmd.param(1) })
}

/// Player line `param1`.
pub fn play_speech(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if cmd.param(1) < 0 {
        return Ok(Control::Advance);
    }
    speak(ctx, cmd, SpeechRequest::Player { index: cmd.param(1) })
}

/// Scene line `param2` of type `param1`. `param3` blocks, `param4` marks a
/// conversation line and `param7` seeds the latch.
pub fn play_speech_scene2(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if !(0..20).contains(&cmd.param(1)) || cmd.param(2) < 0 {
        return Ok(Control::Advance);
    }
    let state = &mut *ctx.state;
    state.seed_with(|state| state.latch = cmd.param(7) != 0);

    if state.is_waiting() {
        if ctx.services.mixer.is_playing(state.handle) {
            return Ok(Control::Repeat);
        }
        ctx.frame.script_hold = false;
        state.complete();

        let world = &mut ctx.scene.world;
        if !state.latch {
            if cmd.param(4) != 0 {
                world.flags.clear(SPEECH_GAME_FLAG);
            }
            state.latch = true;
            return Ok(Control::Advance);
        }
        world.engine_flags.remove(SPEECH_FLAGS);
        return Ok(Control::Advance);
    }

    let request = SpeechRequest::Scene {
        kind: cmd.param(1),
        index: cmd.param(2),
    };
    state.handle = ctx.services.play_speech(request).unwrap_or_default();
    let world = &mut ctx.scene.world;
    if cmd.param(4) != 0 && !state.latch {
        world.flags.set(SPEECH_GAME_FLAG);
    }
    if cmd.param(3) != 0 {
        ctx.frame.script_hold = true;
        state.wait();
        if state.latch {
            world.engine_flags.remove(SPEECH_FLAGS);
        }
        return Ok(Control::Repeat);
    }
    Ok(Control::Advance)
}

/// Says ambient line `param1` and waits for it. With `param2`, actor
/// `param5` talks meanwhile; otherwise object `param3` takes over the
/// animation of object `param4` for the duration.
pub fn play_ambient_speech(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let (speaker, listener, actor) = (cmd.param(3), cmd.param(4), cmd.param(5));

    if ctx.state.is_waiting() {
        if ctx.services.speech_is_playing() {
            return Ok(Control::Repeat);
        }
        ctx.state.complete();
        if actor != 0 {
            ctx.scene
                .actor_mut(actor)?
                .update_status(ActorStatus::Enabled, ctx.services)?;
        } else if listener != speaker && listener != 0 {
            ctx.object_mut(speaker)?.disable();
            let object = ctx.object_mut(listener)?;
            object.set_next_frame(object.flags);
        }
        ctx.frame.script_hold = false;
        ctx.services.speech.reset();
        return Ok(Control::Advance);
    }

    ctx.frame.script_hold = true;
    let volume = ctx.services.config.voice_volume;
    let services = &mut *ctx.services;
    services
        .speech
        .play(services.mixer.as_mut(), SpeechLine::ambient(cmd.param(1)), volume);

    if cmd.param(2) != 0 {
        ctx.scene
            .actor_mut(actor)?
            .update_status(ActorStatus::Talking, ctx.services)?;
    } else if listener != speaker {
        let mut flags = ObjectFlags::empty();
        if listener != 0 {
            let object = ctx.object_mut(listener)?;
            flags = object.flags;
            object.disable();
        }
        if speaker != 0 {
            ctx.object_mut(speaker)?.set_next_frame(flags);
        }
    }
    ctx.state.wait();
    Ok(Control::Repeat)
}

/// Continues after line `param2` when sound `param1` plays (`param3 == 1`)
/// or when it does not.
pub fn jump_if_sound_playing(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let playing = ctx.is_playing(cmd.param(1));
    let jump = if cmd.param(3) == 1 { playing } else { !playing };
    Ok(if jump {
        Control::Goto(cmd.param(2) + 1)
    } else {
        Control::Advance
    })
}

pub fn stop_sound(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if ctx.is_playing(cmd.param(1)) {
        ctx.services.mixer.stop(cmd.param(1));
    }
    Ok(Control::Advance)
}

/// Holds until the current speech line ends. A set `param1` keeps the
/// speech flags raised meanwhile.
pub fn wait_for_speech(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.state.seed_with(|state| state.latch = cmd.param(1) != 0);
    if ctx.state.latch {
        ctx.scene.world.engine_flags.insert(SPEECH_FLAGS);
    }
    if ctx.services.speech_is_playing() {
        return Ok(Control::Repeat);
    }
    ctx.state.latch = true;
    Ok(Control::Advance)
}
