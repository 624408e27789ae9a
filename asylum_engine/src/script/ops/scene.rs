//! Screen, camera and scene-level opcodes. Anything the core cannot do by
//! itself (loading scenes, puzzles, movies, menus) becomes a
//! [`FrameRequest`] for the host.

use asylum_formats::{make_resource, ScriptCommand};

use crate::actor::ActorStatus;
use crate::audio::MUSIC_STOPPED;
use crate::error::{ContentError, ContentResult};
use crate::frame::FrameRequest;
use crate::graphics::{Point, GREY_STEPS, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::resources::{PACK_MUSIC, SCENE_PACK_OFFSET};
use crate::script::command::{Control, OpContext};
use crate::world::{
    EngineFlags, MATTE_BAR_MAX, MOTION_SCROLL, MOTION_SCROLL_WAIT, MOTION_STILL,
};

const CHANGE_SCENE_OPCODE: i32 = 0x2B;
const SCENE_FADE_MS: i32 = 75;
const SCENE_FADE_STEPS: i32 = 8;
const RECT_FADE_MS: i32 = 25;
const RECT_FADE_STEPS: i32 = 10;
const MATTE_HALF_OPEN: i32 = 90;
const WIDE_SCREEN_STEPS: i32 = 22;

pub fn hide_cursor(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.world().cursor_visible = false;
    Ok(Control::Advance)
}

pub fn show_cursor(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    let world = ctx.world();
    world.cursor_visible = true;
    world.engine_flags.remove(EngineFlags::TYPE1);
    Ok(Control::Advance)
}

/// Camera to (`param1`, `param2`). A `param3` below 1 jumps there; otherwise
/// it scrolls at `param3` pixels per tick, waiting for arrival when `param4`
/// is set. `param5` seeds the wait latch.
pub fn move_scene_position(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let target = Point::new(cmd.param(1), cmd.param(2));
    let speed = cmd.param(3);
    let state = &mut *ctx.state;
    let camera = &mut ctx.scene.world.camera;

    if speed < 1 {
        camera.set_position(target.x, target.y);
        camera.motion_status = MOTION_STILL;
        return Ok(Control::Advance);
    }
    if cmd.param(4) == 0 {
        camera.motion_status = MOTION_SCROLL;
        if camera.scroll_to(target, speed) {
            camera.motion_status = MOTION_STILL;
        }
        return Ok(Control::Advance);
    }

    state.seed_with(|state| state.latch = cmd.param(5) != 0);
    if state.latch {
        if camera.motion_status == MOTION_SCROLL_WAIT {
            return Ok(Control::Repeat);
        }
        state.latch = false;
        return Ok(Control::Advance);
    }

    state.latch = true;
    camera.motion_status = MOTION_SCROLL_WAIT;
    if camera.scroll_to(target, speed) {
        camera.motion_status = MOTION_STILL;
    }
    Ok(Control::Repeat)
}

pub fn set_scene_motion_status(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.world().camera.motion_status = cmd.param(1);
    Ok(Control::Advance)
}

/// Starts encounter `param1` and waits for it to end.
pub fn run_encounter(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let encounters = &mut ctx.services.encounters;
    encounters.set_flag5(cmd.param(5));

    if ctx.state.is_waiting() {
        if encounters.is_running() {
            return Ok(Control::Repeat);
        }
        ctx.state.complete();
        return Ok(Control::Advance);
    }

    encounters.run(cmd.param(1), cmd.param(2), cmd.param(3), cmd.param(4));
    ctx.state.wait();
    Ok(Control::Repeat)
}

/// Fades out, silences everything and asks the host for scene `param1`.
pub fn change_scene(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene
        .actor_mut(0)?
        .update_status(ActorStatus::Disabled, ctx.services)?;
    ctx.queue.reset();

    let scene = &mut *ctx.scene;
    scene.palette.palette_fade(
        0,
        SCENE_FADE_MS,
        SCENE_FADE_STEPS,
        ctx.platform,
        scene.compositor.back_buffer(),
    );
    scene.compositor.clear();

    ctx.services.mixer.stop_all();
    ctx.services.mixer.stop_music();

    let pack = cmd.param(1) + SCENE_PACK_OFFSET;
    ctx.frame.request(FrameRequest::ChangeScene { pack });
    ctx.record(format!("scene.change {pack}"));
    Ok(Control::Exit { advance: false })
}

/// Closes the matte bars, lets the host play movie `param1` once they are
/// shut, then restores the palette and music. `param2` set skips the bar
/// intro, `param3` set keeps the music off afterwards.
pub fn play_movie(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let matte = &mut ctx.scene.world.matte;
    if matte.bar_height < MATTE_BAR_MAX {
        if matte.bar_height == 0 {
            matte.var1 = 1;
            matte.bar_height = 1;
            matte.var2 = 0;
            matte.play_sound = cmd.param(3) == 0;
            matte.initialized = cmd.param(2) == 0;
            matte.pending_video = Some(cmd.param(1));
            ctx.scene.world.cursor_visible = false;
            ctx.scene.palette.make_grey_palette();
        }
        return Ok(Control::Repeat);
    }

    let action_index = ctx.scene.player()?.action_index3;
    let world = &ctx.scene.world;
    let palette_id = usize::try_from(action_index)
        .ok()
        .and_then(|index| world.action_areas.get(index))
        .map(|area| area.palette_resource_id)
        .filter(|id| *id != 0)
        .unwrap_or(world.current_palette_id);
    if palette_id != 0 {
        let resources = ctx.services.resources.as_ref();
        ctx.scene.palette.set_palette(resources, palette_id)?;
        ctx.scene.palette.set_gamma_level(resources, palette_id)?;
    }

    let world = &mut ctx.scene.world;
    world.matte.bar_height = 0;

    let leads_to_scene_change = !world.matte.play_sound && {
        let lines = ctx.script.commands.first().map_or(0, |first| first.num_lines);
        ctx.script
            .commands
            .iter()
            .take(usize::try_from(lines).unwrap_or(0))
            .any(|command| command.opcode == CHANGE_SCENE_OPCODE)
    };
    if !leads_to_scene_change
        && world.matte.var2 == 0
        && world.music_resource_index != MUSIC_STOPPED
    {
        let music = make_resource(PACK_MUSIC, world.music_resource_index as u32);
        let volume = ctx.services.config.music_volume;
        ctx.services.mixer.change_music(music, volume);
    }

    world.cursor_visible = true;
    world.matte.var2 = 0;
    Ok(Control::Advance)
}

/// Switches to scene rectangle `param1 & 0xFF` behind a short fade.
pub fn reset_scene_rect(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let index = (cmd.param(1) & 0xFF) as usize;
    let rect = ctx
        .scene
        .world
        .scene_rects
        .get(index)
        .copied()
        .ok_or(ContentError::InvalidParameter {
            opcode: "ResetSceneRect",
            name: "param1",
            value: cmd.param(1),
        })?;

    let scene = &mut *ctx.scene;
    scene.palette.palette_fade(
        0,
        RECT_FADE_MS,
        RECT_FADE_STEPS,
        ctx.platform,
        scene.compositor.back_buffer(),
    );

    let world = &mut scene.world;
    world.scene_rect_index = index;
    world.engine_flags.insert(EngineFlags::SCENE_RECT_CHANGED);
    world.camera.set_position(rect.left, rect.top);
    Ok(Control::Advance)
}

pub fn run_blow_up_puzzle(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene.compositor.clear();
    ctx.scene.queue.clear();
    ctx.frame.request(FrameRequest::RunPuzzle { index: cmd.param(1) });
    ctx.record(format!("puzzle.run {}", cmd.param(1)));
    Ok(Control::Exit { advance: true })
}

/// Morphs the palette to grey over [`GREY_STEPS`] ticks, then clears the
/// screen and hands back to the frame loop.
pub fn grey_palette_transition(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let state = &mut *ctx.state;
    state.seed_with(|state| {
        state.counter = cmd.param(1);
        state.latch = cmd.param(2) != 0;
    });
    let scene = &mut *ctx.scene;

    if !state.latch {
        scene.palette.make_grey_palette();
        state.latch = true;
    }

    if state.counter >= GREY_STEPS {
        scene.compositor.clear();
        scene.queue.clear();
        state.counter = 0;
        state.latch = false;
        return Ok(Control::Exit { advance: true });
    }

    scene.palette.update_grey_palette(state.counter);
    state.counter += 1;
    Ok(Control::Repeat)
}

/// Grows the widescreen bars by 4 pixels a tick.
pub fn update_wide_screen(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let state = &mut *ctx.state;
    state.seed_with(|state| state.counter = cmd.param(1));
    let world = &mut ctx.scene.world;

    if state.counter >= WIDE_SCREEN_STEPS {
        state.counter = 0;
        world.matte.bar_height = 0;
        world.wide_screen_bar = 0;
        return Ok(Control::Advance);
    }

    world.wide_screen_bar = 4 * state.counter;
    state.counter += 1;
    Ok(Control::Repeat)
}

/// Centres the camera on actor `param1` at speed `param2`. `param3` waits
/// for the scroll to end; `param6` seeds the wait latch.
pub fn move_scene_position_from_actor(
    ctx: &mut OpContext<'_>,
    cmd: &ScriptCommand,
) -> ContentResult<Control> {
    let actor = ctx.scene.actor(cmd.param(1))?;
    let target = Point::new(
        actor.x1 + actor.x2 / 2 - SCREEN_WIDTH / 2,
        actor.y1 + actor.y2 / 2 - SCREEN_HEIGHT / 2,
    );
    let speed = cmd.param(2);
    let camera = &mut ctx.scene.world.camera;

    if cmd.param(3) == 0 {
        camera.motion_status = MOTION_SCROLL;
        if camera.scroll_to(target, speed) {
            camera.motion_status = MOTION_STILL;
        }
        return Ok(Control::Advance);
    }

    let state = &mut *ctx.state;
    state.seed_with(|state| state.latch = cmd.param(6) != 0);
    if state.latch {
        if camera.motion_status == MOTION_SCROLL_WAIT {
            return Ok(Control::Repeat);
        }
        state.latch = false;
        camera.cancel_scroll();
        return Ok(Control::Advance);
    }

    state.latch = true;
    camera.motion_status = MOTION_SCROLL_WAIT;
    if camera.scroll_to(target, speed) {
        state.latch = false;
        camera.motion_status = MOTION_STILL;
        return Ok(Control::Advance);
    }
    Ok(Control::Repeat)
}

/// Blocking fade to black, `param1` ms per step over `param2` steps.
pub fn palette_fade(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let scene = &mut *ctx.scene;
    scene.palette.palette_fade(
        0,
        cmd.param(1),
        cmd.param(2),
        ctx.platform,
        scene.compositor.back_buffer(),
    );
    Ok(Control::Advance)
}

/// Fades towards the scene palette in the background.
pub fn start_palette_fade(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let target = ctx.scene.world.current_palette_id;
    ctx.scene.palette.start_fade(
        ctx.services.resources.as_ref(),
        target,
        cmd.param(1),
        cmd.param(2),
        ctx.frame.now,
    )?;
    Ok(Control::Advance)
}

/// Holds until the matte bars have closed, starting them at `initial`
/// height, then opens them again.
fn matte_bars(ctx: &mut OpContext<'_>, initial: i32) -> Control {
    let world = &mut ctx.scene.world;
    world.matte.var1 = 0;
    world.matte.initialized = true;

    if world.matte.bar_height >= MATTE_BAR_MAX {
        world.matte.bar_height = 0;
        world.cursor_visible = true;
        return Control::Advance;
    }
    if world.matte.bar_height == 0 {
        world.cursor_visible = false;
        world.matte.bar_height = initial;
    }
    Control::Repeat
}

pub fn open_matte_bars(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    Ok(matte_bars(ctx, 1))
}

pub fn open_matte_bars_with_sound(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene.world.matte.play_sound = true;
    Ok(matte_bars(ctx, MATTE_HALF_OPEN))
}

pub fn clear_screen(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene.world.skip_draw_scene = cmd.param(1) != 0;
    if cmd.param(1) != 0 {
        ctx.scene.compositor.clear();
    }
    Ok(Control::Advance)
}

pub fn quit(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene.compositor.clear();
    ctx.frame.request(FrameRequest::Quit);
    Ok(Control::Exit { advance: false })
}

/// Makes scene graphic `param1` the current palette.
pub fn set_resource_palette(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let id = usize::try_from(cmd.param(1))
        .ok()
        .and_then(|index| ctx.scene.world.graphic_resource_ids.get(index))
        .copied()
        .ok_or(ContentError::InvalidParameter {
            opcode: "SetResourcePalette",
            name: "param1",
            value: cmd.param(1),
        })?;
    ctx.scene.world.current_palette_id = id;
    let resources = ctx.services.resources.as_ref();
    ctx.scene.palette.set_palette(resources, id)?;
    ctx.scene.palette.set_gamma_level(resources, id)?;
    Ok(Control::Advance)
}

pub fn show_options_screen(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.frame.request(FrameRequest::ShowOptions);
    Ok(Control::Advance)
}
