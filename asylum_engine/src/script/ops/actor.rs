//! Actor control: visibility, placement, statuses, walking and reactions.

use asylum_formats::ScriptCommand;

use crate::actor::{Actor, ActorStatus, DIRECTION_DELTAS};
use crate::error::ContentResult;
use crate::graphics::Point;
use crate::resources::SpeechRequest;
use crate::scene::FaceTarget;
use crate::script::command::{check_param, Control, OpContext};

/// Steps the player backs away after an interaction.
const INTERACTION_STEP_BACK: i32 = 3;

pub fn hide_actor(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let actor = ctx.scene.actor_mut(cmd.param(1))?;
    actor.set_visible(false, ctx.services.mixer.as_mut());
    actor.update_from_direction(actor.direction, ctx.services.resources.as_ref())?;
    Ok(Control::Advance)
}

pub fn show_actor(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let actor = ctx.scene.actor_mut(cmd.param(1))?;
    actor.set_visible(true, ctx.services.mixer.as_mut());
    actor.update_from_direction(actor.direction, ctx.services.resources.as_ref())?;
    actor.tick_value = ctx.frame.now;
    Ok(Control::Advance)
}

/// Puts actor `param1` at `(param2, param3)` facing `param4` on frame
/// `param5`.
pub fn set_actor_position(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene.actor_mut(cmd.param(1))?.set_position(
        cmd.param(2),
        cmd.param(3),
        cmd.param(4),
        cmd.param(5),
        ctx.services.resources.as_ref(),
    )?;
    Ok(Control::Advance)
}

pub fn disable_actor(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.scene
        .actor_mut(cmd.param(1))?
        .update_status(ActorStatus::Disabled, ctx.services)?;
    Ok(Control::Advance)
}

pub fn enable_actor(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let actor = ctx.scene.actor_mut(cmd.param(1))?;
    if actor.status == ActorStatus::Disabled {
        actor.update_status(ActorStatus::Enabled, ctx.services)?;
    }
    Ok(Control::Advance)
}

/// Plans a walk to `(param2, param3)`; when the point cannot be reached the
/// script goes on after line `param4`, with a complaint if `param5` is set.
pub fn jump_actor_speech(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let (actor, world) = ctx.scene.actor_and_world(cmd.param(1))?;
    if actor.process(cmd.param(2), cmd.param(3), world) {
        return Ok(Control::Advance);
    }
    if cmd.param(5) != 0 {
        ctx.services.play_speech(SpeechRequest::Indexed { index: 1 });
    }
    Ok(Control::Goto(cmd.param(4) + 1))
}

/// Turns actor `param1` to `param4` once it stands on `(param2, param3)`,
/// walking there first if needed. `param5 == 1` waits for the walk.
pub fn jump_and_set_direction(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let (x, y, direction) = (cmd.param(2), cmd.param(3), cmd.param(4));
    let waiting = ctx.state.is_waiting();
    let (actor, world) = ctx.scene.actor_and_world(cmd.param(1))?;

    if actor.status.is_walking_to() {
        return Ok(if waiting {
            Control::Repeat
        } else {
            Control::Advance
        });
    }

    if waiting {
        ctx.state.complete();
        if actor.is_at(x, y) {
            actor.update_from_direction(direction, ctx.services.resources.as_ref())?;
        }
        return Ok(Control::Advance);
    }

    if x == -1 || y == -1 || actor.is_at(x, y) {
        actor.update_from_direction(direction, ctx.services.resources.as_ref())?;
    } else {
        actor.process_status(x, y, direction != 0, world, ctx.services)?;
        if cmd.param(5) == 1 {
            ctx.state.wait();
            return Ok(Control::Repeat);
        }
    }
    Ok(Control::Advance)
}

pub fn jump_if_actor_coordinates(
    ctx: &mut OpContext<'_>,
    cmd: &ScriptCommand,
) -> ContentResult<Control> {
    let actor = ctx.scene.actor(cmd.param(1))?;
    if actor.is_at(cmd.param(2), cmd.param(3)) {
        Ok(Control::Advance)
    } else {
        Ok(Control::Goto(cmd.param(4) + 1))
    }
}

pub fn add_reaction_hive(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let index = ctx.actor_or_queued(cmd.param(3));
    ctx.actor_mut(index)?.add_reaction(cmd.param(1), cmd.param(2));
    Ok(Control::Advance)
}

pub fn remove_reaction_hive(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let index = ctx.actor_or_queued(cmd.param(3));
    ctx.actor_mut(index)?.remove_reaction(cmd.param(1), cmd.param(2));
    Ok(Control::Advance)
}

/// Jumps to `param2` unless the actor holds reaction `param1` with a counter
/// of at least `param3`.
pub fn jump_if_reaction_hive(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let index = ctx.actor_or_queued(cmd.param(4));
    if ctx.scene.actor(index)?.has_reaction(cmd.param(1), cmd.param(3)) {
        Ok(Control::Advance)
    } else {
        Ok(Control::Label(cmd.param(2)))
    }
}

pub fn set_actor_script_flag(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.actor_mut(cmd.param(1))?.script_flag = cmd.param(2);
    Ok(Control::Advance)
}

pub fn jump_if_actor_script_flag(
    ctx: &mut OpContext<'_>,
    cmd: &ScriptCommand,
) -> ContentResult<Control> {
    if ctx.scene.actor(cmd.param(1))?.script_flag != 0 {
        Ok(Control::Goto(cmd.param(3) + 1))
    } else {
        Ok(Control::Advance)
    }
}

/// Plays interaction `param1` of the queued actor facing `param2` (8 means
/// the player's direction) and waits for it to end. Interaction 2 makes the
/// player step back afterwards, and needs room to do so.
pub fn play_actor_interaction(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let player_index = ctx.scene.player_index();
    let actor_index = ctx.actor_index;
    let player = ctx.scene.actor(player_index)?;
    let player_point = player.center();
    let player_direction = player.direction;
    let back = (player_direction + 4).rem_euclid(8);
    let direction = if cmd.param(2) == 8 {
        player_direction
    } else {
        cmd.param(2)
    };
    let steps_back = cmd.param(1) == 2;

    if ctx.state.is_waiting() {
        let actor = ctx.scene.actor_mut(actor_index)?;
        match actor.status {
            ActorStatus::InteractionDone => actor.update_status(ActorStatus::Enabled, ctx.services)?,
            ActorStatus::Status16 => {}
            ActorStatus::InteractionDone2 => {
                actor.update_status(ActorStatus::Enabled2, ctx.services)?
            }
            _ => return Ok(Control::Repeat),
        }
        let actor_direction = actor.direction;
        ctx.state.complete();

        if steps_back
            && Actor::can_step(&ctx.scene.world, player_point, back, INTERACTION_STEP_BACK)
        {
            let delta = DIRECTION_DELTAS[back as usize];
            let point = Point::new(
                player_point.x + INTERACTION_STEP_BACK * delta.x,
                player_point.y + INTERACTION_STEP_BACK * delta.y,
            );
            ctx.scene.actor_mut(player_index)?.set_position(
                point.x,
                point.y,
                actor_direction,
                0,
                ctx.services.resources.as_ref(),
            )?;
        }
        return Ok(Control::Advance);
    }

    if steps_back && !Actor::can_step(&ctx.scene.world, player_point, back, INTERACTION_STEP_BACK) {
        return Ok(Control::Advance);
    }

    let slot = if direction >= 5 {
        5 * cmd.param(1) - direction + 38
    } else {
        5 * cmd.param(1) + direction + 30
    };
    let actor = ctx.scene.actor_mut(actor_index)?;
    let id = actor.graphic_slot(slot)?;
    actor.set_graphic(id, ctx.services.resources.as_ref());
    actor.direction = direction;
    let status = if actor.status <= ActorStatus::Status11 {
        ActorStatus::Interacting
    } else {
        ActorStatus::Interacting2
    };
    actor.update_status(status, ctx.services)?;
    ctx.state.wait();
    Ok(Control::Repeat)
}

/// Goes on after line `param2` unless the script runs for actor `param1`
/// (-1 meaning the player).
pub fn jump_if_actor(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let index = if cmd.param(1) == -1 {
        ctx.scene.player_index()
    } else {
        cmd.param(1)
    };
    if ctx.actor_index != index {
        Ok(Control::Goto(cmd.param(2)))
    } else {
        Ok(Control::Advance)
    }
}

pub fn actor_face_target(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let from = check_param(
        "ActorFaceTarget",
        "param3",
        cmd.param(3),
        (0..=3).contains(&cmd.param(3)),
    )?;
    let target = FaceTarget::from_params(cmd.param(2), from).unwrap_or(FaceTarget::Point(0));
    ctx.scene
        .face_target(cmd.param(1), target, ctx.services.resources.as_ref())?;
    Ok(Control::Advance)
}

pub fn change_player_actor_index(
    ctx: &mut OpContext<'_>,
    cmd: &ScriptCommand,
) -> ContentResult<Control> {
    let index = cmd.param(1);
    ctx.scene.actor(index)?;
    ctx.scene.world.player_actor_index = index as usize;
    ctx.record(format!("player.change {index}"));
    Ok(Control::Advance)
}

/// Raw status change without graphic updates.
pub fn change_actor_status(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let actor = ctx.actor_mut(cmd.param(1))?;
    if cmd.param(2) != 0 {
        if actor.status < ActorStatus::Status11 {
            actor.status = ActorStatus::Enabled2;
        }
    } else {
        actor.status = ActorStatus::Enabled;
    }
    Ok(Control::Advance)
}

/// Drops every pending draw of the actor's graphics.
pub fn delete_graphics(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let ids = ctx.scene.actor(cmd.param(1))?.graphic_resource_ids.clone();
    for id in ids {
        ctx.scene.queue.remove_resource(id);
    }
    Ok(Control::Advance)
}

pub fn set_actor_update_mode(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.actor_mut(cmd.param(1))?.update_mode = cmd.param(2);
    Ok(Control::Advance)
}

/// Sends the player next to actor `param1`. On arrival the player faces the
/// actor, then turns about. Unreachable targets go on after line `param3`;
/// `param4` adds a complaint, `param2 == 1` waits for the walk.
pub fn walk_to_actor(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    let player_index = ctx.scene.player_index();
    let waiting = ctx.state.is_waiting();
    let watched = if waiting { player_index } else { cmd.param(1) };
    if ctx.scene.actor(watched)?.status.is_walking_to() {
        return Ok(if waiting {
            Control::Repeat
        } else {
            Control::Advance
        });
    }

    if waiting {
        ctx.state.complete();
        let point = ctx.state.point;
        if !ctx.scene.actor(player_index)?.is_at(point.x, point.y) {
            return Ok(Control::Goto(cmd.param(3) + 1));
        }
        let resources = ctx.services.resources.as_ref();
        ctx.scene
            .face_target(player_index, FaceTarget::Actor(cmd.param(1)), resources)?;
        let player = ctx.scene.actor_mut(player_index)?;
        let about = (player.direction + 4) & 7;
        player.update_from_direction(about, resources)?;
        return Ok(Control::Advance);
    }

    let target = ctx.scene.actor(cmd.param(1))?.center();
    if !ctx.scene.world.is_walkable(target) {
        if cmd.param(4) != 0 {
            ctx.services.play_speech(SpeechRequest::Indexed { index: 1 });
        }
        return Ok(Control::Goto(cmd.param(3) + 1));
    }

    let (player, world) = ctx.scene.actor_and_world(player_index)?;
    player.process_status(target.x, target.y, cmd.param(4) != 0, world, ctx.services)?;
    ctx.state.point = target;
    if cmd.param(2) == 1 {
        ctx.state.wait();
        return Ok(Control::Repeat);
    }
    Ok(Control::Advance)
}

pub fn set_actor_action_index2(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.actor_mut(cmd.param(1))?.action_index2 = cmd.param(2);
    Ok(Control::Advance)
}

/// Stores `param2..param9` as the actor's behaviour request.
pub fn set_actor_behaviour(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.actor_mut(cmd.param(1))?
        .behaviour
        .copy_from_slice(&cmd.params[1..]);
    Ok(Control::Advance)
}

pub fn clear_actor_behaviour(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    ctx.actor_mut(cmd.param(1))?.clear_behaviour();
    Ok(Control::Advance)
}

/// Asks the frame loop to switch the player to actor `param1` and waits
/// until it has.
pub fn change_player(ctx: &mut OpContext<'_>, cmd: &ScriptCommand) -> ContentResult<Control> {
    if ctx.state.is_waiting() {
        if ctx.scene.world.pending_player_change.is_some() {
            return Ok(Control::Repeat);
        }
        ctx.state.complete();
        return Ok(Control::Advance);
    }
    let index = cmd.param(1);
    ctx.scene.actor(index)?;
    ctx.scene.world.pending_player_change = Some(index as usize);
    ctx.state.wait();
    Ok(Control::Repeat)
}
