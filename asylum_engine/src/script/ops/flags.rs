//! Game flags and the interaction kinds offered by objects, action areas and
//! actors.

use asylum_formats::ScriptCommand;

use crate::error::ContentResult;
use crate::script::command::{Control, OpContext};
use crate::world::ActionType;

/// Bit of an action area's flags toggled by scripts.
const ACTION_AREA_SCRIPT_BIT: i32 = 1;

pub fn set_game_flag(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if cmd.param(1) >= 0 {
        ctx.world().flags.set(cmd.param(1));
    }
    Ok(Control::Advance)
}

pub fn clear_game_flag(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if cmd.param(1) >= 0 {
        ctx.world().flags.clear(cmd.param(1));
    }
    Ok(Control::Advance)
}

pub fn toggle_game_flag(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if cmd.param(1) >= 0 {
        ctx.world().flags.toggle(cmd.param(1));
    }
    Ok(Control::Advance)
}

/// Jumps to `param3` when flag `param1` is set (`param2` non-zero) or clear.
pub fn jump_if_game_flag(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let flag = cmd.param(1);
    if flag < 0 {
        return Ok(Control::Advance);
    }
    let set = ctx.world().flags.is_set(flag);
    let jump = if cmd.param(2) != 0 { set } else { !set };
    Ok(if jump {
        Control::Label(cmd.param(3))
    } else {
        Control::Advance
    })
}

/// `param2` picks the target: 1 an action area, 2 an actor, anything else an
/// object. `param1` names it.
fn update_action_type(
    ctx: &mut OpContext<'_>,
    cmd: &ScriptCommand,
    kind: ActionType,
    set: bool,
) -> ContentResult<Control> {
    let id = cmd.param(1);
    let action_type = match cmd.param(2) {
        1 => &mut ctx.world().action_area_mut(id)?.action_type,
        2 => &mut ctx.actor_mut(id)?.action_type,
        _ => &mut ctx.object_mut(id)?.action_type,
    };
    action_type.set(kind, set);
    Ok(Control::Advance)
}

/// `param3` picks the target: 0 an object, 1 an action area, anything else
/// an actor. Jumps to `param2` when the kind is not offered.
fn jump_if_action_type(
    ctx: &mut OpContext<'_>,
    cmd: &ScriptCommand,
    kind: ActionType,
) -> ContentResult<Control> {
    let id = cmd.param(1);
    let action_type = match cmd.param(3) {
        0 => ctx.object_mut(id)?.action_type,
        1 => ctx.world().action_area(id)?.action_type,
        _ => ctx.actor_mut(id)?.action_type,
    };
    Ok(if action_type.contains(kind) {
        Control::Advance
    } else {
        Control::Label(cmd.param(2))
    })
}

macro_rules! action_ops {
    ($kind:expr, $jump:ident, $set:ident, $clear:ident) => {
        pub fn $jump(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
            jump_if_action_type(ctx, cmd, $kind)
        }

        pub fn $set(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
            update_action_type(ctx, cmd, $kind, true)
        }

        pub fn $clear(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
            update_action_type(ctx, cmd, $kind, false)
        }
    };
}

action_ops!(ActionType::FIND, jump_if_action_find, set_action_find, clear_action_find);
action_ops!(ActionType::GRAB, jump_if_action_grab, set_action_grab, clear_action_grab);
action_ops!(ActionType::TALK, jump_if_action_talk, set_action_talk, clear_action_talk);
action_ops!(ActionType::TYPE16, jump_if_action16, set_action16, clear_action16);
action_ops!(ActionType::TYPE8, jump_if_action8, set_action8, clear_action8);

pub fn set_action_area_flags(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let area = ctx.world().action_area_mut(cmd.param(1))?;
    if cmd.param(2) != 0 {
        area.flags |= ACTION_AREA_SCRIPT_BIT;
    } else {
        area.flags &= !ACTION_AREA_SCRIPT_BIT;
    }
    Ok(Control::Advance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Rect;
    use crate::object::Object;
    use crate::script::ops::testing::OpRig;
    use crate::world::ActionArea;

    #[test]
    fn game_flags_ignore_negative_ids() {
        let mut rig = OpRig::new();
        rig.run(set_game_flag, 0x01, &[12]).unwrap();
        rig.run(set_game_flag, 0x01, &[-3]).unwrap();
        rig.run(toggle_game_flag, 0x03, &[13]).unwrap();
        rig.run(clear_game_flag, 0x02, &[12]).unwrap();
        assert_eq!(rig.scene.world.flags.iter().collect::<Vec<_>>(), vec![13]);
    }

    #[test]
    fn flag_jump_follows_the_requested_polarity() {
        let mut rig = OpRig::new();
        rig.scene.world.flags.set(4);
        assert_eq!(rig.run(jump_if_game_flag, 0x04, &[4, 1, 9]), Ok(Control::Label(9)));
        assert_eq!(rig.run(jump_if_game_flag, 0x04, &[4, 0, 9]), Ok(Control::Advance));
        assert_eq!(rig.run(jump_if_game_flag, 0x04, &[5, 0, 9]), Ok(Control::Label(9)));
        assert_eq!(rig.run(jump_if_game_flag, 0x04, &[-1, 0, 9]), Ok(Control::Advance));
    }

    #[test]
    fn action_types_route_by_target_kind() {
        let mut rig = OpRig::new();
        rig.scene.objects.push(Object::new(30, 0, 1));
        rig.scene
            .world
            .action_areas
            .push(ActionArea::new(2, 0, Rect::new(0, 0, 4, 4)));

        rig.run(set_action_find, 0x1A, &[30, 0]).unwrap();
        rig.run(set_action_talk, 0x20, &[2, 1]).unwrap();
        rig.run(set_action_grab, 0x1D, &[1, 2]).unwrap();
        assert_eq!(rig.scene.objects[0].action_type, ActionType::FIND);
        assert_eq!(rig.scene.world.action_areas[0].action_type, ActionType::TALK);
        assert_eq!(rig.scene.actors[1].action_type, ActionType::GRAB);

        assert_eq!(rig.run(jump_if_action_find, 0x19, &[30, 6, 0]), Ok(Control::Advance));
        assert_eq!(rig.run(jump_if_action_talk, 0x1F, &[2, 6, 1]), Ok(Control::Advance));
        assert_eq!(rig.run(jump_if_action8, 0x38, &[1, 6, 2]), Ok(Control::Label(6)));

        rig.run(clear_action_find, 0x1B, &[30, 0]).unwrap();
        assert_eq!(rig.run(jump_if_action_find, 0x19, &[30, 6, 0]), Ok(Control::Label(6)));
        assert!(rig.run(set_action16, 0x27, &[99, 1]).is_err());
    }

    #[test]
    fn action_area_flag_bit_follows_param2() {
        let mut rig = OpRig::new();
        rig.scene
            .world
            .action_areas
            .push(ActionArea::new(5, 0, Rect::new(0, 0, 4, 4)));
        rig.scene.world.action_areas[0].flags = 0x10;
        rig.run(set_action_area_flags, 0x60, &[5, 1]).unwrap();
        assert_eq!(rig.scene.world.action_areas[0].flags, 0x11);
        rig.run(set_action_area_flags, 0x60, &[5, 0]).unwrap();
        assert_eq!(rig.scene.world.action_areas[0].flags, 0x10);
    }
}
