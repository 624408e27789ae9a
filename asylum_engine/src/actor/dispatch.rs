//! Per-status update handlers, resolved from a table keyed by status,
//! chapter range and actor index range.

use std::ops::RangeInclusive;

use crate::error::ContentResult;
use crate::frame::TickContext;
use crate::world::World;

use super::{Actor, ActorStatus, UPDATE_MODE_FROZEN};

pub type StatusHandler = fn(&mut Actor, &mut TickContext<'_>, &mut World) -> ContentResult<()>;

/// Idle time before a disabled actor may fidget.
const DISABLED_FIDGET_MS: u64 = 300;
/// Idle time before an enabled actor may fidget.
const ENABLED_FIDGET_MS: u64 = 500;

#[derive(Debug, Clone)]
struct Entry {
    status: ActorStatus,
    chapters: Option<RangeInclusive<i32>>,
    actors: Option<RangeInclusive<usize>>,
    name: &'static str,
    handler: StatusHandler,
}

impl Entry {
    /// Higher wins: actor-specific entries beat chapter-specific ones, which
    /// beat defaults.
    fn rank(&self) -> u8 {
        match (&self.actors, &self.chapters) {
            (Some(_), _) => 2,
            (None, Some(_)) => 1,
            (None, None) => 0,
        }
    }

    fn matches(&self, status: ActorStatus, chapter: i32, actor: usize) -> bool {
        self.status == status
            && self.chapters.as_ref().is_none_or(|range| range.contains(&chapter))
            && self.actors.as_ref().is_none_or(|range| range.contains(&actor))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusDispatch {
    entries: Vec<Entry>,
}

impl StatusDispatch {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The handlers every chapter shares.
    pub fn builtin() -> Self {
        let mut dispatch = StatusDispatch::empty();
        dispatch.register_default(ActorStatus::Disabled, "disabled", update_disabled);
        for status in [ActorStatus::ShowingInventory, ActorStatus::Status10] {
            dispatch.register_default(status, "loop", update_loop);
        }
        dispatch.register_default(ActorStatus::Talking, "talking", update_talking);
        dispatch.register_default(
            ActorStatus::InteractionDone,
            "interaction-done",
            update_interaction_done,
        );
        dispatch.register_default(ActorStatus::Enabled, "enabled", update_enabled);
        for status in [ActorStatus::Interacting, ActorStatus::Interacting2] {
            dispatch.register_default(status, "interacting", update_interacting);
        }
        dispatch.register_default(ActorStatus::Fidget, "fidget", update_fidget);
        for status in [
            ActorStatus::Walking,
            ActorStatus::WalkingTo,
            ActorStatus::Walking2,
            ActorStatus::WalkingTo2,
        ] {
            dispatch.register_default(status, "walking", update_walking);
        }
        dispatch
    }

    pub fn register_default(
        &mut self,
        status: ActorStatus,
        name: &'static str,
        handler: StatusHandler,
    ) {
        self.entries.push(Entry {
            status,
            chapters: None,
            actors: None,
            name,
            handler,
        });
    }

    pub fn register_chapter(
        &mut self,
        status: ActorStatus,
        chapters: RangeInclusive<i32>,
        name: &'static str,
        handler: StatusHandler,
    ) {
        self.entries.push(Entry {
            status,
            chapters: Some(chapters),
            actors: None,
            name,
            handler,
        });
    }

    pub fn register_actors(
        &mut self,
        status: ActorStatus,
        chapters: Option<RangeInclusive<i32>>,
        actors: RangeInclusive<usize>,
        name: &'static str,
        handler: StatusHandler,
    ) {
        self.entries.push(Entry {
            status,
            chapters,
            actors: Some(actors),
            name,
            handler,
        });
    }

    fn best(&self, status: ActorStatus, chapter: i32, actor: usize) -> Option<&Entry> {
        // max_by_key keeps the last of equal ranks, so later registrations
        // override earlier ones at the same level.
        self.entries
            .iter()
            .filter(|entry| entry.matches(status, chapter, actor))
            .max_by_key(|entry| entry.rank())
    }

    pub fn resolve(&self, status: ActorStatus, chapter: i32, actor: usize) -> Option<StatusHandler> {
        self.best(status, chapter, actor).map(|entry| entry.handler)
    }

    /// Name of the handler that would run, for logs and transcripts.
    pub fn handler_name(&self, status: ActorStatus, chapter: i32, actor: usize) -> Option<&'static str> {
        self.best(status, chapter, actor).map(|entry| entry.name)
    }
}

fn update_disabled(actor: &mut Actor, ctx: &mut TickContext<'_>, _world: &mut World) -> ContentResult<()> {
    actor.advance_loop();
    if ctx.now.saturating_sub(actor.tick_value) >= DISABLED_FIDGET_MS {
        if ctx.services.random.get_random(100) < 50
            && !ctx.services.speech_is_playing()
            && actor.is_default_direction(super::bucket::FIDGET as usize)
        {
            actor.update_status(ActorStatus::Fidget, ctx.services)?;
        }
        actor.tick_value = ctx.now;
    }
    Ok(())
}

fn update_loop(actor: &mut Actor, _ctx: &mut TickContext<'_>, _world: &mut World) -> ContentResult<()> {
    actor.advance_loop();
    Ok(())
}

fn update_talking(actor: &mut Actor, ctx: &mut TickContext<'_>, _world: &mut World) -> ContentResult<()> {
    let sound = actor.sound_resource_id;
    if ctx.services.encounters.is_running() || sound == 0 || ctx.services.mixer.is_playing(sound) {
        actor.advance_loop();
        return Ok(());
    }
    actor.update_status(ActorStatus::Enabled, ctx.services)?;
    actor.sound_resource_id = 0;
    Ok(())
}

fn update_interaction_done(
    actor: &mut Actor,
    ctx: &mut TickContext<'_>,
    _world: &mut World,
) -> ContentResult<()> {
    actor.update_status(ActorStatus::Enabled, ctx.services)
}

fn update_enabled(actor: &mut Actor, ctx: &mut TickContext<'_>, _world: &mut World) -> ContentResult<()> {
    if actor.update_mode == UPDATE_MODE_FROZEN {
        return Ok(());
    }
    actor.advance_loop();
    if ctx.now.saturating_sub(actor.tick_value) >= ENABLED_FIDGET_MS {
        if !ctx.script_processing && ctx.services.random.get_random(100) < 50 {
            actor.update_status(ActorStatus::Fidget, ctx.services)?;
        }
        actor.tick_value = ctx.now;
    }
    Ok(())
}

/// Plays the interaction animation once, then reports it done.
fn update_interacting(
    actor: &mut Actor,
    _ctx: &mut TickContext<'_>,
    _world: &mut World,
) -> ContentResult<()> {
    if actor.frame_index + 1 < actor.frame_count {
        actor.frame_index += 1;
        return Ok(());
    }
    let done = if actor.status == ActorStatus::Interacting2 {
        ActorStatus::InteractionDone2
    } else {
        ActorStatus::InteractionDone
    };
    actor.frame_index = 0;
    actor.status = done;
    Ok(())
}

fn update_fidget(actor: &mut Actor, ctx: &mut TickContext<'_>, _world: &mut World) -> ContentResult<()> {
    if actor.frame_index + 1 < actor.frame_count {
        actor.frame_index += 1;
        return Ok(());
    }
    actor.update_status(ActorStatus::Enabled, ctx.services)?;
    actor.tick_value = ctx.now;
    Ok(())
}

fn update_walking(actor: &mut Actor, ctx: &mut TickContext<'_>, _world: &mut World) -> ContentResult<()> {
    actor.advance_loop();
    if !actor.status.is_walking_to() {
        return Ok(());
    }
    let step = ctx.services.config.walk_step;
    if actor.step_walk(step, ctx.services.resources.as_ref())? {
        let rest = if actor.status.is_alternate() {
            ActorStatus::Enabled2
        } else {
            ActorStatus::Enabled
        };
        actor.update_status(rest, ctx.services)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::tests::rigged;
    use crate::graphics::Point;
    use crate::random::GameRandom;
    use crate::services::Services;

    fn noop(_: &mut Actor, _: &mut TickContext<'_>, _: &mut World) -> ContentResult<()> {
        Ok(())
    }

    fn tick<'a>(services: &'a mut Services, now: u64) -> TickContext<'a> {
        TickContext {
            now,
            script_processing: false,
            services,
            listener: Point::new(320, 240),
            camera: Point::new(0, 0),
        }
    }

    /// Seeds for which a fresh actor of `status` starts fidgeting on a tick
    /// at `now`.
    fn fidget_seeds(status: ActorStatus, now: u64, script_processing: bool) -> usize {
        let dispatch = StatusDispatch::builtin();
        (0..200u64)
            .filter(|&seed| {
                let (mut actor, mut services) = rigged();
                services.random = GameRandom::new(seed);
                actor.status = status;
                let mut world = World::new();
                let mut ctx = tick(&mut services, now);
                ctx.script_processing = script_processing;
                actor.update(&dispatch, &mut ctx, &mut world).unwrap();
                actor.status == ActorStatus::Fidget
            })
            .count()
    }

    #[test]
    fn enabled_actor_fidgets_from_the_idle_threshold() {
        assert_eq!(fidget_seeds(ActorStatus::Enabled, ENABLED_FIDGET_MS - 1, false), 0);
        let fidgets = fidget_seeds(ActorStatus::Enabled, ENABLED_FIDGET_MS, false);
        // 50 in 100 per check
        assert!((60..=140).contains(&fidgets), "{fidgets} of 200 fidgeted");
    }

    #[test]
    fn disabled_actor_fidgets_from_its_shorter_threshold() {
        assert_eq!(fidget_seeds(ActorStatus::Disabled, DISABLED_FIDGET_MS - 1, false), 0);
        let fidgets = fidget_seeds(ActorStatus::Disabled, DISABLED_FIDGET_MS, false);
        assert!((60..=140).contains(&fidgets), "{fidgets} of 200 fidgeted");
    }

    #[test]
    fn script_processing_suppresses_idle_fidgets() {
        assert_eq!(fidget_seeds(ActorStatus::Enabled, 10_000, true), 0);

        let dispatch = StatusDispatch::builtin();
        let (mut actor, mut services) = rigged();
        let mut world = World::new();
        let mut ctx = tick(&mut services, 10_000);
        ctx.script_processing = true;
        actor.update(&dispatch, &mut ctx, &mut world).unwrap();
        // the check still counts, so the next chance waits a full period
        assert_eq!(actor.tick_value, 10_000);
    }

    #[test]
    fn actor_entries_beat_chapter_entries_beat_defaults() {
        let mut dispatch = StatusDispatch::empty();
        dispatch.register_default(ActorStatus::Enabled, "default", noop);
        dispatch.register_chapter(ActorStatus::Enabled, 2..=3, "chapter", noop);
        dispatch.register_actors(ActorStatus::Enabled, Some(2..=2), 10..=12, "actor", noop);

        assert_eq!(dispatch.handler_name(ActorStatus::Enabled, 1, 11), Some("default"));
        assert_eq!(dispatch.handler_name(ActorStatus::Enabled, 3, 11), Some("chapter"));
        assert_eq!(dispatch.handler_name(ActorStatus::Enabled, 2, 11), Some("actor"));
        assert_eq!(dispatch.handler_name(ActorStatus::Enabled, 2, 13), Some("chapter"));
        assert_eq!(dispatch.handler_name(ActorStatus::Talking, 2, 11), None);
    }

    #[test]
    fn later_registration_overrides_at_equal_rank() {
        let mut dispatch = StatusDispatch::builtin();
        dispatch.register_default(ActorStatus::Enabled, "replacement", noop);
        assert_eq!(
            dispatch.handler_name(ActorStatus::Enabled, 1, 0),
            Some("replacement")
        );
    }

    #[test]
    fn interaction_plays_once_then_enables() {
        let dispatch = StatusDispatch::builtin();
        let (mut actor, mut services) = rigged();
        let mut world = World::new();
        actor.status = ActorStatus::Interacting;
        actor.frame_count = 3;

        for now in 0..3 {
            actor.update(&dispatch, &mut tick(&mut services, now), &mut world).unwrap();
        }
        assert_eq!(actor.status, ActorStatus::InteractionDone);
        actor.update(&dispatch, &mut tick(&mut services, 4), &mut world).unwrap();
        assert_eq!(actor.status, ActorStatus::Enabled);
    }

    #[test]
    fn talking_ends_when_the_voice_stops() {
        let dispatch = StatusDispatch::builtin();
        let (mut actor, mut services) = rigged();
        let mut world = World::new();
        actor.status = ActorStatus::Talking;
        actor.sound_resource_id = 77;
        services.mixer.play_sound(77, false, 0, 0);

        actor.update(&dispatch, &mut tick(&mut services, 0), &mut world).unwrap();
        assert_eq!(actor.status, ActorStatus::Talking);

        services.mixer.stop(77);
        actor.update(&dispatch, &mut tick(&mut services, 1), &mut world).unwrap();
        assert_eq!(actor.status, ActorStatus::Enabled);
        assert_eq!(actor.sound_resource_id, 0);
    }

    #[test]
    fn frozen_actor_does_not_animate() {
        let dispatch = StatusDispatch::builtin();
        let (mut actor, mut services) = rigged();
        let mut world = World::new();
        actor.frame_count = 4;
        actor.update_mode = UPDATE_MODE_FROZEN;
        actor.update(&dispatch, &mut tick(&mut services, 1000), &mut world).unwrap();
        assert_eq!(actor.frame_index, 0);
        assert_eq!(actor.status, ActorStatus::Enabled);
    }

    #[test]
    fn walker_arrives_and_rests() {
        let dispatch = StatusDispatch::builtin();
        let (mut actor, mut services) = rigged();
        let mut world = World::new();
        actor
            .process_status(40, 0, false, &world, &mut services)
            .unwrap();
        for now in 0..10 {
            actor.update(&dispatch, &mut tick(&mut services, now), &mut world).unwrap();
        }
        assert!(actor.is_at(40, 0));
        assert_eq!(actor.status, ActorStatus::Enabled);
        assert_eq!(actor.direction, 6);
    }
}
