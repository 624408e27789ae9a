//! One frame of the engine: input, timers, scripts, entity updates and
//! drawing, in that order.

use asylum_formats::ScriptRecord;
use log::info;
use serde::Serialize;

use crate::error::ContentResult;
use crate::frame::{FrameContext, FrameRequest};
use crate::platform::{InputEvent, Key, Platform};
use crate::scene::Scene;
use crate::script::{Interpreter, StepOutcome};
use crate::services::Services;

/// What happened during one [`Engine::tick`].
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub outcome: StepOutcome,
    pub requests: Vec<FrameRequest>,
}

impl TickReport {
    pub fn requested(&self, request: FrameRequest) -> bool {
        self.requests.contains(&request)
    }
}

pub struct Engine {
    pub scene: Scene,
    pub services: Services,
    pub interpreter: Interpreter,
    pub frame: FrameContext,
    last_tick: Option<u64>,
}

impl Engine {
    pub fn new(scene: Scene, services: Services, scripts: Vec<ScriptRecord>) -> Self {
        let interpreter = Interpreter::new(
            scripts,
            services.config.strict_content_errors,
            services.config.max_steps_per_tick,
        );
        Engine {
            scene,
            services,
            interpreter,
            frame: FrameContext::new(),
            last_tick: None,
        }
    }

    pub fn queue_script(&mut self, script_index: i32, actor_index: i32) -> bool {
        self.interpreter.queue_script(script_index, actor_index)
    }

    /// Runs one frame. A script that exits to the frame loop skips the
    /// entity update and the draw; the returned requests tell the host why.
    pub fn tick(&mut self, platform: &mut dyn Platform) -> ContentResult<TickReport> {
        let now = platform.millis();
        self.frame.begin_tick(now);
        self.drain_input(platform);

        let elapsed = self.last_tick.map_or(0, |last| now.saturating_sub(last));
        self.last_tick = Some(now);
        self.services.mixer.advance(elapsed);
        self.advance_timers(now);

        let before = self.scene.actor_statuses();
        let outcome = self.interpreter.process(
            &mut self.scene,
            &mut self.services,
            &mut self.frame,
            platform,
        )?;
        if outcome == StepOutcome::Exited {
            self.scene.record_status_changes(&before);
            return Ok(self.report(outcome));
        }

        self.scene.update_entities(
            &mut self.services,
            now,
            self.frame.is_script_processing(),
        )?;
        self.draw()?;
        platform.present(
            self.scene.compositor.back_buffer(),
            self.scene.palette.palette(),
        );
        self.scene.record_status_changes(&before);
        Ok(self.report(outcome))
    }

    fn drain_input(&mut self, platform: &mut dyn Platform) {
        while let Some(event) = platform.poll_event() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown { key: Key::Escape } => {
                    self.frame.request(FrameRequest::Quit)
                }
                InputEvent::MouseMove { position }
                | InputEvent::MouseDown { position, .. }
                | InputEvent::MouseUp { position, .. } => self.frame.mouse = position,
                InputEvent::KeyDown { .. } => {}
            }
        }
    }

    fn advance_timers(&mut self, now: u64) {
        self.scene.palette.tick_fade(now);
        let world = &mut self.scene.world;
        world.camera.step();
        if let Some(video) = world.matte.advance() {
            self.frame.request(FrameRequest::PlayVideo { index: video });
            self.scene.record(format!("video.play {video}"));
        }
        if let Some(index) = self.scene.world.pending_player_change.take() {
            self.scene.world.player_actor_index = index;
            self.scene.record(format!("player.change {index}"));
        }
    }

    fn draw(&mut self) -> ContentResult<()> {
        let performance = self.services.config.performance;
        let resources = self.services.resources.as_ref();
        let scene = &mut self.scene;
        if !scene.world.skip_draw_scene {
            scene.draw_background(resources)?;
            scene.queue_entities(performance);
            scene
                .queue
                .flush(&mut scene.compositor, resources, performance)?;
        }
        let bars = if scene.world.matte.is_active() {
            scene.world.matte.bar_height
        } else {
            scene.world.wide_screen_bar
        };
        scene.compositor.draw_wide_screen_bars(bars);
        Ok(())
    }

    fn report(&self, outcome: StepOutcome) -> TickReport {
        if !self.frame.requests.is_empty() {
            info!("tick {}: {:?}", self.frame.tick, self.frame.requests);
        }
        TickReport {
            tick: self.frame.tick,
            outcome,
            requests: self.frame.requests.clone(),
        }
    }
}
