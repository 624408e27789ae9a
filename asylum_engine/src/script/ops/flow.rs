//! Control flow: returns, jumps, counted waits and the per-script value.

use asylum_formats::ScriptCommand;

use crate::error::ContentResult;
use crate::script::command::{Control, OpContext};

pub fn finish(_ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    Ok(Control::Done)
}

pub fn nop(_ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    Ok(Control::Advance)
}

pub fn jump(_ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    Ok(Control::Goto(cmd.param(1)))
}

/// Holds the line for two extra ticks.
pub fn wait_cycles(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let state = &mut *ctx.state;
    state.seed_with(|state| state.counter = cmd.param(1));
    if state.counter >= 2 {
        state.counter = 0;
        return Ok(Control::Advance);
    }
    state.counter += 1;
    Ok(Control::Repeat)
}

/// Holds the line for `param1` ticks; zero passes straight through.
pub fn count_loop(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let limit = cmd.param(1);
    if limit == 0 {
        return Ok(Control::Advance);
    }
    let state = &mut *ctx.state;
    state.seed_with(|state| state.counter = cmd.param(2));
    if state.counter >= limit {
        state.counter = 0;
        return Ok(Control::Advance);
    }
    state.counter += 1;
    Ok(Control::Repeat)
}

pub fn jump_random(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if ctx.services.random.get_random(cmd.param(1)) < cmd.param(2) {
        return Ok(Control::Advance);
    }
    Ok(Control::Label(cmd.param(3)))
}

pub fn stop_processing(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.queue.set_skip_processing(true);
    Ok(Control::Advance)
}

pub fn resume_processing(ctx: &mut OpContext<'_>, _cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.queue.set_skip_processing(false);
    Ok(Control::Advance)
}

/// `param1` as is, or a random value below it when `param2` is set.
pub fn set_script_value(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.vars.value = if cmd.param(2) != 0 {
        ctx.services.random.get_random(cmd.param(1))
    } else {
        cmd.param(1)
    };
    Ok(Control::Advance)
}

/// Compares the script value with `param1`. The first set mode among
/// `param2..param7` (==, <, >, <=, >=, !=) decides; when it holds the script
/// carries on, otherwise it jumps to `param8`.
pub fn jump_if_script_value(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let value = ctx.vars.value;
    let operand = cmd.param(1);
    let holds = if cmd.param(2) != 0 {
        value == operand
    } else if cmd.param(3) != 0 {
        value < operand
    } else if cmd.param(4) != 0 {
        value > operand
    } else if cmd.param(5) != 0 {
        value <= operand
    } else if cmd.param(6) != 0 {
        value >= operand
    } else {
        cmd.param(7) == 0 || value != operand
    };
    Ok(if holds {
        Control::Advance
    } else {
        Control::Label(cmd.param(8))
    })
}

/// Queues the script of action area `param1` for actor `param2`.
pub fn queue_script(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let script_index = ctx.scene.world.action_area(cmd.param(1))?.script_index;
    ctx.queue.queue_script(script_index, cmd.param(2));
    Ok(Control::Advance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Rect;
    use crate::script::ops::testing::OpRig;
    use crate::world::ActionArea;

    #[test]
    fn wait_cycles_holds_for_two_extra_ticks() {
        let mut rig = OpRig::new();
        let controls: Vec<_> = (0..4)
            .map(|_| rig.run(wait_cycles, 0x34, &[]).unwrap())
            .collect();
        assert_eq!(
            controls,
            vec![Control::Repeat, Control::Repeat, Control::Advance, Control::Repeat]
        );
    }

    #[test]
    fn count_loop_seeds_from_param2() {
        let mut rig = OpRig::new();
        assert_eq!(rig.run(count_loop, 0x3C, &[3, 2]), Ok(Control::Repeat));
        assert_eq!(rig.run(count_loop, 0x3C, &[3, 2]), Ok(Control::Advance));
        assert_eq!(rig.state.counter, 0);
        assert_eq!(rig.run(count_loop, 0x3C, &[0, 2]), Ok(Control::Advance));
    }

    #[test]
    fn script_value_comparisons() {
        let mut rig = OpRig::new();
        rig.run(set_script_value, 0x54, &[5, 0]).unwrap();
        assert_eq!(rig.vars.value, 5);

        let cases: [(&[i32], Control); 7] = [
            (&[5, 1, 0, 0, 0, 0, 0, 9], Control::Advance),
            (&[6, 1, 0, 0, 0, 0, 0, 9], Control::Label(9)),
            (&[6, 0, 1, 0, 0, 0, 0, 9], Control::Advance),
            (&[4, 0, 0, 1, 0, 0, 0, 9], Control::Advance),
            (&[4, 0, 0, 0, 1, 0, 0, 9], Control::Label(9)),
            (&[5, 0, 0, 0, 0, 1, 0, 9], Control::Advance),
            (&[5, 0, 0, 0, 0, 0, 1, 9], Control::Label(9)),
        ];
        for (params, expected) in cases {
            assert_eq!(rig.run(jump_if_script_value, 0x55, params), Ok(expected), "{params:?}");
        }

        rig.run(set_script_value, 0x54, &[3, 1]).unwrap();
        assert!((0..3).contains(&rig.vars.value));
    }

    #[test]
    fn queue_script_resolves_the_action_area() {
        let mut rig = OpRig::new();
        rig.scene
            .world
            .action_areas
            .push(ActionArea::new(12, 4, Rect::new(0, 0, 1, 1)));
        rig.queue.queue_script(0, 0);
        rig.run(queue_script, 0x5C, &[12, 2]).unwrap();
        assert_eq!(rig.queue.peek().map(|entry| entry.script_index), Some(4));

        rig.run(stop_processing, 0x2F, &[]).unwrap();
        rig.run(queue_script, 0x5C, &[12, 3]).unwrap();
        assert_eq!(rig.queue.len(), 1);
        rig.run(resume_processing, 0x30, &[]).unwrap();
        assert!(!rig.queue.skip_processing());

        assert!(rig.run(queue_script, 0x5C, &[13, 0]).is_err());
    }
}
