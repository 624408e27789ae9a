//! Object control: animation modes, frames, visibility and transparency.

use asylum_formats::{make_resource, ScriptCommand};

use crate::error::ContentResult;
use crate::graphics::Point;
use crate::object::ObjectFlags;
use crate::resources::PACK_SOUND;
use crate::script::command::{check_param, Control, OpContext};

/// Offset added to object transparency levels so they select a table.
const TRANSPARENCY_TABLE_OFFSET: i32 = 3;

/// Starts the animation of object `param1`. `param4` loops it, `param3`
/// plays it backwards once; otherwise it plays once forwards. `param2`
/// waits for a one-shot to end.
pub fn play_animation(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let object = ctx.scene.object_mut(cmd.param(1))?;

    if ctx.state.is_waiting() {
        if object.check_flags() {
            return Ok(Control::Repeat);
        }
        ctx.state.complete();
        return Ok(Control::Advance);
    }

    if cmd.param(4) != 0 {
        object.flags.remove(ObjectFlags::ANIMATION);
        object.flags.insert(ObjectFlags::LOOP);
    } else if cmd.param(3) != 0 {
        object.flags.remove(ObjectFlags::ANIMATION);
        object.flags.insert(ObjectFlags::REVERSE_ONE_SHOT);
    } else if object.flags.contains(ObjectFlags::REVERSE_ONE_SHOT) {
        object.flags.insert(ObjectFlags::ONE_SHOT);
        object.flags.remove(ObjectFlags::REVERSE_ONE_SHOT);
    } else if !object.flags.intersects(ObjectFlags::ANIMATION) {
        object.flags.insert(ObjectFlags::ONE_SHOT);
    }
    object.set_next_frame(object.flags);

    if object.tracks_camera == 1 {
        let point = if object.flags.contains(ObjectFlags::OFFSCREEN) {
            Point::new(object.x, object.y)
        } else {
            object.frame_center(ctx.services.resources.as_ref())?
        };
        ctx.scene.world.shared_point = point;
    }

    if cmd.param(2) != 0 {
        ctx.state.wait();
        return Ok(Control::Repeat);
    }
    Ok(Control::Advance)
}

/// Fades object `param1` in (or out when `param3` is set) over `3 * param2`
/// ticks, tracking progress in the script counter.
pub fn enable_objects(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let ticks_per_level = check_param("EnableObjects", "param2", cmd.param(2), cmd.param(2) > 0)?;
    let fading_out = cmd.param(3) != 0;

    if ctx.vars.counter == 0 && ctx.scene.world.chapter != 13 {
        let sound = make_resource(PACK_SOUND, if fading_out { 6 } else { 1 });
        let volume = ctx.services.config.sfx_volume;
        ctx.services.mixer.play_sound(sound, false, volume, 0);
    }

    let object = ctx.scene.object_mut(cmd.param(1))?;
    if ctx.vars.counter >= 3 * ticks_per_level - 1 {
        ctx.vars.counter = 0;
        object.transparency = 0;
        object.flags.set(ObjectFlags::ENABLED, !fading_out);
        return Ok(Control::Advance);
    }

    ctx.vars.counter += 1;
    let level = ctx.vars.counter / ticks_per_level;
    object.transparency = if fading_out { 3 - level } else { level + 1 };
    object.flags.insert(ObjectFlags::ENABLED);
    Ok(Control::Repeat)
}

pub fn remove_object(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if cmd.param(1) != 0 {
        ctx.scene.remove_object(cmd.param(1))?;
    }
    Ok(Control::Advance)
}

/// Rewinds to the frame the current mode starts from.
pub fn reset_animation(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let object = ctx.object_mut(cmd.param(1))?;
    object.frame_index = if object.flags.contains(ObjectFlags::REVERSE_ONE_SHOT) {
        object.last_frame()
    } else {
        0
    };
    Ok(Control::Advance)
}

pub fn disable_object(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.object_mut(cmd.param(1))?.disable();
    Ok(Control::Advance)
}

pub fn stop_all_objects_sounds(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene
        .object_mut(cmd.param(1))?
        .stop_all_sounds(ctx.services.mixer.as_mut());
    Ok(Control::Advance)
}

/// Frame `value` of `object`, with -1 meaning its last frame.
fn frame_param(opcode: &'static str, value: i32, last: u32) -> ContentResult<u32> {
    if value == -1 {
        return Ok(last);
    }
    check_param(opcode, "param2", value, value >= 0).map(|frame| frame as u32)
}

pub fn wait_until_frame_played(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let object = ctx.scene.object(cmd.param(1))?;
    let frame = frame_param("WaitUntilFramePlayed", cmd.param(2), object.last_frame())?;
    if object.frame_index != frame {
        return Ok(Control::Repeat);
    }
    Ok(Control::Advance)
}

/// Compares the frame of object `param1` with `param2` (-1 = last). The
/// first set mode among `param3..param7` (==, <, >, <=, >=) decides;
/// `param8` alone jumps when the frames are equal. Jumps go to `param9`.
pub fn jump_object_frame(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let object = ctx.scene.object(cmd.param(1))?;
    let current = object.frame_index;
    let frame = frame_param("JumpObjectFrame", cmd.param(2), object.last_frame())?;
    let holds = if cmd.param(3) != 0 {
        current == frame
    } else if cmd.param(4) != 0 {
        current < frame
    } else if cmd.param(5) != 0 {
        current > frame
    } else if cmd.param(6) != 0 {
        current <= frame
    } else if cmd.param(7) != 0 {
        current >= frame
    } else {
        cmd.param(8) == 0 || current != frame
    };
    Ok(if holds {
        Control::Advance
    } else {
        Control::Label(cmd.param(9))
    })
}

/// Shows (`param3` set) or hides object `param1` on frame `param2`.
pub fn set_object_frame_index_and_flags(
    ctx: &mut OpContext<'_>,
    cmd: &ScriptCommand,
) -> ContentResult<Control> {
    let frame = check_param(
        "SetObjectFrameIndexAndFlags",
        "param2",
        cmd.param(2),
        cmd.param(2) >= 0,
    )?;
    let object = ctx.object_mut(cmd.param(1))?;
    object.flags.set(ObjectFlags::ENABLED, cmd.param(3) != 0);
    object.frame_index = frame as u32;
    Ok(Control::Advance)
}

/// Lets the animation of object `param1` slow down (`param2` set) or stops
/// it outright. `param3` waits until no mode bit is left.
pub fn stop_object_animation(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let object = ctx.object_mut(cmd.param(1))?;
    if cmd.param(2) != 0 {
        object.flags.insert(ObjectFlags::DECELERATE);
    } else {
        object.flags.remove(ObjectFlags::ANIMATION);
    }
    if cmd.param(3) != 0 && object.flags.intersects(ObjectFlags::ANIMATION) {
        return Ok(Control::Repeat);
    }
    Ok(Control::Advance)
}

/// Level `param2` in 0..=3: on object `param1` when set, else on actor
/// `param3`. Out of range levels are ignored.
pub fn set_transparency(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let level = cmd.param(2);
    if !(0..=3).contains(&level) {
        log::warn!("ignoring transparency level {level}");
        return Ok(Control::Advance);
    }
    if cmd.param(1) != 0 {
        let object = ctx.object_mut(cmd.param(1))?;
        object.transparency = if level != 0 {
            level + TRANSPARENCY_TABLE_OFFSET
        } else {
            0
        };
    } else {
        ctx.actor_mut(cmd.param(3))?.transparency = level;
    }
    Ok(Control::Advance)
}

pub fn wait_object_last_frame(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let object = ctx.object_mut(cmd.param(1))?;
    if object.frame_index == object.last_frame() {
        object.flags.remove(ObjectFlags::ANIMATION);
        return Ok(Control::Advance);
    }
    Ok(Control::Repeat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioEvent;
    use crate::error::ContentError;
    use crate::object::Object;
    use crate::resources::InMemoryResources;
    use crate::script::ops::testing::OpRig;
    use crate::script::state::Phase;
    use asylum_formats::{GraphicFrame, GraphicResource};

    const PROP: i32 = 70;

    fn rig_with_prop(frames: u32) -> OpRig {
        let mut resources = InMemoryResources::new();
        resources.insert_graphic(
            0x0200_0000,
            GraphicResource::new(vec![GraphicFrame::solid(10, 20, 1); frames as usize]),
        );
        let mut rig = OpRig::with_resources(resources);
        rig.scene.objects.push(Object::new(PROP, 0x0200_0000, frames));
        rig
    }

    #[test]
    fn one_shot_waits_until_it_ends() {
        let mut rig = rig_with_prop(4);
        assert_eq!(rig.run(play_animation, 0x07, &[PROP, 1]), Ok(Control::Repeat));
        assert!(rig.scene.objects[0].flags.contains(ObjectFlags::ONE_SHOT));
        assert_eq!(rig.run(play_animation, 0x07, &[PROP, 1]), Ok(Control::Repeat));

        rig.scene.objects[0].flags.remove(ObjectFlags::ONE_SHOT);
        assert_eq!(rig.run(play_animation, 0x07, &[PROP, 1]), Ok(Control::Advance));
        assert_eq!(rig.state.phase, Phase::Completed);
    }

    #[test]
    fn animation_modes_replace_each_other() {
        let mut rig = rig_with_prop(4);
        rig.run(play_animation, 0x07, &[PROP, 0, 1]).unwrap();
        let object = &rig.scene.objects[0];
        assert!(object.flags.contains(ObjectFlags::REVERSE_ONE_SHOT));
        assert_eq!(object.frame_index, 3);

        rig.run(play_animation, 0x07, &[PROP]).unwrap();
        let object = &rig.scene.objects[0];
        assert!(object.flags.contains(ObjectFlags::ONE_SHOT));
        assert!(!object.flags.contains(ObjectFlags::REVERSE_ONE_SHOT));
        assert_eq!(object.frame_index, 0);

        rig.run(play_animation, 0x07, &[PROP, 0, 0, 1]).unwrap();
        let flags = rig.scene.objects[0].flags;
        assert_eq!(flags & ObjectFlags::ANIMATION, ObjectFlags::LOOP);
    }

    #[test]
    fn camera_tracking_objects_move_the_shared_point() {
        let mut rig = rig_with_prop(2);
        let object = &mut rig.scene.objects[0];
        object.tracks_camera = 1;
        object.x = 100;
        object.y = 50;
        rig.run(play_animation, 0x07, &[PROP]).unwrap();
        assert_eq!(rig.scene.world.shared_point, Point::new(105, 60));
    }

    #[test]
    fn enable_objects_fades_in_over_the_script_counter() {
        let mut rig = rig_with_prop(1);
        rig.scene.objects[0].disable();
        let mut levels = Vec::new();
        loop {
            let control = rig.run(enable_objects, 0x0F, &[PROP, 2, 0]).unwrap();
            levels.push(rig.scene.objects[0].transparency);
            if control == Control::Advance {
                break;
            }
        }
        assert_eq!(levels, vec![1, 2, 2, 3, 3, 0]);
        assert!(rig.scene.objects[0].is_enabled());
        assert_eq!(rig.vars.counter, 0);
        assert_eq!(
            rig.mixer.events()[0],
            AudioEvent::SoundPlay {
                id: make_resource(PACK_SOUND, 1),
                looping: false,
                volume: rig.services.config.sfx_volume,
                pan: 0
            }
        );
        assert!(matches!(
            rig.run(enable_objects, 0x0F, &[PROP, 0, 0]),
            Err(ContentError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn fade_out_disables_at_the_end() {
        let mut rig = rig_with_prop(1);
        while rig.run(enable_objects, 0x0F, &[PROP, 1, 1]).unwrap() == Control::Repeat {}
        assert!(!rig.scene.objects[0].is_enabled());
    }

    #[test]
    fn frame_waits_understand_the_last_frame_sentinel() {
        let mut rig = rig_with_prop(5);
        assert_eq!(
            rig.run(wait_until_frame_played, 0x3D, &[PROP, -1]),
            Ok(Control::Repeat)
        );
        rig.scene.objects[0].frame_index = 4;
        assert_eq!(
            rig.run(wait_until_frame_played, 0x3D, &[PROP, -1]),
            Ok(Control::Advance)
        );
        assert_eq!(
            rig.run(jump_object_frame, 0x51, &[PROP, -1, 1, 0, 0, 0, 0, 0, 12]),
            Ok(Control::Advance)
        );
        assert_eq!(
            rig.run(jump_object_frame, 0x51, &[PROP, 2, 0, 1, 0, 0, 0, 0, 12]),
            Ok(Control::Label(12))
        );
        assert_eq!(
            rig.run(jump_object_frame, 0x51, &[PROP, 4, 0, 0, 0, 0, 0, 1, 12]),
            Ok(Control::Label(12))
        );
        assert_eq!(
            rig.run(jump_object_frame, 0x51, &[PROP, 3, 0, 0, 0, 0, 0, 1, 12]),
            Ok(Control::Advance)
        );
    }

    #[test]
    fn last_frame_wait_stops_the_animation() {
        let mut rig = rig_with_prop(3);
        rig.scene.objects[0].flags.insert(ObjectFlags::LOOP);
        assert_eq!(rig.run(wait_object_last_frame, 0x5F, &[PROP]), Ok(Control::Repeat));
        rig.scene.objects[0].frame_index = 2;
        assert_eq!(rig.run(wait_object_last_frame, 0x5F, &[PROP]), Ok(Control::Advance));
        assert!(!rig.scene.objects[0].flags.intersects(ObjectFlags::ANIMATION));
    }

    #[test]
    fn deceleration_waits_for_the_modes_to_clear() {
        let mut rig = rig_with_prop(3);
        rig.scene.objects[0].flags.insert(ObjectFlags::LOOP);
        assert_eq!(rig.run(stop_object_animation, 0x59, &[PROP, 1, 1]), Ok(Control::Repeat));
        assert!(rig.scene.objects[0].flags.contains(ObjectFlags::DECELERATE));
        assert_eq!(rig.run(stop_object_animation, 0x59, &[PROP, 0, 1]), Ok(Control::Advance));
    }

    #[test]
    fn transparency_targets_objects_or_actors() {
        let mut rig = rig_with_prop(1);
        rig.run(set_transparency, 0x5B, &[PROP, 2]).unwrap();
        assert_eq!(rig.scene.objects[0].transparency, 5);
        rig.run(set_transparency, 0x5B, &[PROP, 0]).unwrap();
        assert_eq!(rig.scene.objects[0].transparency, 0);
        rig.run(set_transparency, 0x5B, &[0, 3, 2]).unwrap();
        assert_eq!(rig.scene.actors[2].transparency, 3);
        rig.run(set_transparency, 0x5B, &[0, 7, 2]).unwrap();
        assert_eq!(rig.scene.actors[2].transparency, 3);
    }

    #[test]
    fn frame_and_visibility_in_one_go() {
        let mut rig = rig_with_prop(3);
        rig.run(set_object_frame_index_and_flags, 0x58, &[PROP, 2, 0])
            .unwrap();
        assert!(!rig.scene.objects[0].is_enabled());
        assert_eq!(rig.scene.objects[0].frame_index, 2);
        rig.run(reset_animation, 0x16, &[PROP]).unwrap();
        assert_eq!(rig.scene.objects[0].frame_index, 0);
        rig.run(remove_object, 0x11, &[PROP]).unwrap();
        assert!(rig.scene.objects[0].flags.contains(ObjectFlags::REMOVED));
    }
}
