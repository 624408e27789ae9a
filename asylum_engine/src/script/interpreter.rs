//! Runs the current script line by line until it finishes, waits or hands
//! control back to the frame loop.

use asylum_formats::ScriptRecord;
use log::{debug, error, warn};
use serde::Serialize;

use crate::error::{ContentError, ContentResult};
use crate::frame::FrameContext;
use crate::platform::Platform;
use crate::scene::Scene;
use crate::services::Services;

use super::command::{describe, Control, OpContext};
use super::opcode::{self, is_return};
use super::queue::{ScriptQueue, ScriptQueueEntry};
use super::state::{ScriptVars, StateTable};

/// How a call to [`Interpreter::process`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// No script was current.
    Idle,
    /// The current script waits on a line until a later tick.
    Yielded,
    /// The current script finished; the next queued entry, if any, is current.
    Finished,
    /// A line asked the frame loop to take over before anything else runs.
    Exited,
    /// A content fault ended the script (lenient mode only).
    Aborted,
}

pub struct Interpreter {
    scripts: Vec<ScriptRecord>,
    vars: Vec<ScriptVars>,
    states: StateTable,
    queue: ScriptQueue,
    line: usize,
    started: Option<ScriptQueueEntry>,
    strict: bool,
    max_steps: usize,
}

impl Interpreter {
    pub fn new(scripts: Vec<ScriptRecord>, strict: bool, max_steps: usize) -> Self {
        let vars = scripts.iter().map(ScriptVars::from_record).collect();
        Interpreter {
            scripts,
            vars,
            states: StateTable::new(),
            queue: ScriptQueue::new(),
            line: 0,
            started: None,
            strict,
            max_steps: max_steps.max(1),
        }
    }

    pub fn scripts(&self) -> &[ScriptRecord] {
        &self.scripts
    }

    pub fn queue(&self) -> &ScriptQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut ScriptQueue {
        &mut self.queue
    }

    pub fn queue_script(&mut self, script_index: i32, actor_index: i32) -> bool {
        self.queue.queue_script(script_index, actor_index)
    }

    /// Cursor of the current script.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn vars(&self, script: usize) -> Option<&ScriptVars> {
        self.vars.get(script)
    }

    pub fn states(&self) -> &StateTable {
        &self.states
    }

    /// Steps the current script. Content faults end the script with an
    /// error log unless the interpreter is strict.
    pub fn process(
        &mut self,
        scene: &mut Scene,
        services: &mut Services,
        frame: &mut FrameContext,
        platform: &mut dyn Platform,
    ) -> ContentResult<StepOutcome> {
        let Some(entry) = self.queue.current() else {
            return Ok(StepOutcome::Idle);
        };
        if self.started != Some(entry) {
            self.started = Some(entry);
            scene.record(format!(
                "script.start {} actor {}",
                entry.script_index, entry.actor_index
            ));
        }

        frame.script_processing = true;
        let result = self.run(entry, scene, services, frame, platform);
        frame.script_processing = false;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) if !self.strict => {
                error!("script {} aborted: {err}", entry.script_index);
                scene.record(format!("script.abort {}", entry.script_index));
                // A line left waiting would resume mid-wait on the next run.
                if let Ok(index) = usize::try_from(entry.script_index) {
                    self.states.reset_script(index);
                }
                self.finish();
                Ok(StepOutcome::Aborted)
            }
            Err(err) => Err(err),
        }
    }

    fn finish(&mut self) {
        self.line = 0;
        self.started = None;
        self.queue.advance();
    }

    fn run(
        &mut self,
        entry: ScriptQueueEntry,
        scene: &mut Scene,
        services: &mut Services,
        frame: &mut FrameContext,
        platform: &mut dyn Platform,
    ) -> ContentResult<StepOutcome> {
        let index = usize::try_from(entry.script_index)
            .ok()
            .filter(|index| *index < self.scripts.len())
            .ok_or(ContentError::MissingScript(entry.script_index))?;

        for _ in 0..self.max_steps {
            let script = &self.scripts[index];
            let line = self.line;
            let command = *script
                .commands
                .get(line)
                .ok_or(ContentError::LineOutOfRange {
                    script: index,
                    line: line as i64,
                    count: script.commands.len(),
                })?;
            let op = opcode::lookup(command.opcode).ok_or(ContentError::UnknownOpcode {
                script: index,
                line,
                opcode: command.opcode,
            })?;
            debug!("[{index}:{line}] {} {}", op.name, describe(&command));

            let mut ctx = OpContext {
                scene: &mut *scene,
                services: &mut *services,
                frame: &mut *frame,
                platform: &mut *platform,
                state: self.states.line_mut(index, line),
                vars: &mut self.vars[index],
                queue: &mut self.queue,
                script,
                script_index: index,
                line,
                actor_index: entry.actor_index,
            };
            let control = (op.handler)(&mut ctx, &command)?;

            match control {
                Control::Advance => self.line += 1,
                Control::Repeat => return Ok(StepOutcome::Yielded),
                Control::Label(target) => {
                    let target = checked_line(index, script, target)?;
                    if !is_return(script.commands[target].opcode) {
                        warn!(
                            "script {index} line {line}: jump target {target} is not a Return line, ending the script"
                        );
                        self.finish();
                        return Ok(StepOutcome::Finished);
                    }
                    self.line = target + 1;
                }
                Control::Goto(target) => self.line = checked_line(index, script, target)?,
                Control::Done => {
                    self.finish();
                    return Ok(StepOutcome::Finished);
                }
                Control::Exit { advance } => {
                    if advance {
                        self.line += 1;
                    }
                    return Ok(StepOutcome::Exited);
                }
            }
        }
        Err(ContentError::RunawayScript {
            script: index,
            limit: self.max_steps,
        })
    }
}

fn checked_line(index: usize, script: &ScriptRecord, target: i32) -> ContentResult<usize> {
    usize::try_from(target)
        .ok()
        .filter(|line| *line < script.commands.len())
        .ok_or(ContentError::LineOutOfRange {
            script: index,
            line: target as i64,
            count: script.commands.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingMixer;
    use crate::config::EngineConfig;
    use crate::platform::HeadlessPlatform;
    use crate::resources::InMemoryResources;
    use asylum_formats::ScriptCommand;

    struct Rig {
        scene: Scene,
        services: Services,
        frame: FrameContext,
        platform: HeadlessPlatform,
        mixer: RecordingMixer,
    }

    impl Rig {
        fn new() -> Self {
            let mixer = RecordingMixer::new();
            let services = Services::new(EngineConfig::default(), Box::new(InMemoryResources::new()))
                .with_mixer(Box::new(mixer.clone()));
            Rig {
                scene: Scene::new(0).with_actors(vec![crate::actor::Actor::new(0)]),
                services,
                frame: FrameContext::new(),
                platform: HeadlessPlatform::new(),
                mixer,
            }
        }

        fn step(&mut self, interpreter: &mut Interpreter) -> ContentResult<StepOutcome> {
            interpreter.process(
                &mut self.scene,
                &mut self.services,
                &mut self.frame,
                &mut self.platform,
            )
        }
    }

    fn script(commands: &[(i32, &[i32])]) -> ScriptRecord {
        ScriptRecord::new(
            commands
                .iter()
                .map(|(opcode, params)| ScriptCommand::new(*opcode, params))
                .collect(),
        )
    }

    fn ret() -> (i32, &'static [i32]) {
        (0x00, &[])
    }

    #[test]
    fn return_finishes_and_promotes_the_next_entry() {
        let mut rig = Rig::new();
        let mut interpreter =
            Interpreter::new(vec![script(&[ret()]), script(&[ret()])], true, 64);
        interpreter.queue_script(0, 0);
        interpreter.queue_script(1, 7);

        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Finished));
        assert_eq!(
            interpreter.queue().current(),
            Some(ScriptQueueEntry {
                script_index: 1,
                actor_index: 7
            })
        );
        assert_eq!(interpreter.line(), 0);
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Finished));
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Idle));
        assert_eq!(
            rig.scene.events,
            vec!["script.start 0 actor 0", "script.start 1 actor 7"]
        );
    }

    #[test]
    fn sound_wait_repeats_until_the_sound_stops() {
        let mut rig = Rig::new();
        let sound = 0x4000_0001;
        let mut interpreter = Interpreter::new(
            vec![script(&[(0x18, &[sound, 1]), (0x01, &[5]), ret()])],
            true,
            64,
        );
        interpreter.queue_script(0, 0);

        for _ in 0..3 {
            assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Yielded));
            assert_eq!(interpreter.line(), 0);
        }
        rig.mixer.finish(sound);
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Finished));
        assert!(rig.scene.world.flags.is_set(5));
    }

    #[test]
    fn label_must_land_on_a_return_line() {
        let mut rig = Rig::new();
        let mut interpreter = Interpreter::new(
            vec![script(&[
                (0x04, &[9, 0, 3]),
                (0x01, &[1]),
                ret(),
                ret(),
                (0x01, &[2]),
                ret(),
            ])],
            true,
            64,
        );
        interpreter.queue_script(0, 0);
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Finished));
        assert!(!rig.scene.world.flags.is_set(1));
        assert!(rig.scene.world.flags.is_set(2));

        let mut interpreter = Interpreter::new(
            vec![script(&[(0x04, &[9, 0, 1]), (0x01, &[1]), ret()])],
            true,
            64,
        );
        interpreter.queue_script(0, 0);
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Finished));
        assert!(!rig.scene.world.flags.is_set(1));
    }

    #[test]
    fn content_faults_are_fatal_when_strict() {
        let mut rig = Rig::new();
        let mut interpreter = Interpreter::new(vec![script(&[(0x70, &[])])], true, 64);
        interpreter.queue_script(0, 0);
        assert_eq!(
            rig.step(&mut interpreter),
            Err(ContentError::UnknownOpcode {
                script: 0,
                line: 0,
                opcode: 0x70
            })
        );

        let mut interpreter = Interpreter::new(vec![script(&[(0x01, &[3])])], true, 64);
        interpreter.queue_script(0, 0);
        assert!(matches!(
            rig.step(&mut interpreter),
            Err(ContentError::LineOutOfRange { line: 1, .. })
        ));

        let mut interpreter = Interpreter::new(Vec::new(), true, 64);
        interpreter.queue_script(2, 0);
        assert_eq!(rig.step(&mut interpreter), Err(ContentError::MissingScript(2)));
    }

    #[test]
    fn lenient_mode_ends_the_faulty_script() {
        let mut rig = Rig::new();
        let mut interpreter = Interpreter::new(
            vec![script(&[(0x09, &[42]), ret()]), script(&[(0x01, &[8]), ret()])],
            false,
            64,
        );
        interpreter.queue_script(0, 0);
        interpreter.queue_script(1, 0);
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Aborted));
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Finished));
        assert!(rig.scene.world.flags.is_set(8));
        assert!(rig.scene.events.contains(&"script.abort 0".to_string()));
    }

    #[test]
    fn aborted_script_forgets_its_line_state() {
        let mut rig = Rig::new();
        let mut interpreter = Interpreter::new(
            vec![script(&[(0x09, &[42]), ret()]), script(&[ret()])],
            false,
            64,
        );
        interpreter.states.line_mut(0, 1).wait();
        interpreter.states.line_mut(1, 0).wait();
        interpreter.queue_script(0, 0);

        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Aborted));
        assert!(interpreter.states().line(0, 1).is_none());
        assert!(interpreter
            .states()
            .line(1, 0)
            .is_some_and(|state| state.is_waiting()));
    }

    #[test]
    fn finished_script_keeps_its_registers() {
        let mut rig = Rig::new();
        let mut interpreter = Interpreter::new(vec![script(&[(0x34, &[]), ret()])], true, 64);
        interpreter.queue_script(0, 0);
        while rig.step(&mut interpreter) == Ok(StepOutcome::Yielded) {}
        assert!(interpreter.states().line(0, 0).is_some());
    }

    #[test]
    fn endless_jumps_trip_the_runaway_guard() {
        let mut rig = Rig::new();
        let mut interpreter = Interpreter::new(vec![script(&[(0x36, &[0])])], true, 16);
        interpreter.queue_script(0, 0);
        assert_eq!(
            rig.step(&mut interpreter),
            Err(ContentError::RunawayScript {
                script: 0,
                limit: 16
            })
        );
    }

    #[test]
    fn processing_flag_is_cleared_after_the_step() {
        let mut rig = Rig::new();
        let mut interpreter = Interpreter::new(vec![script(&[(0x34, &[]), ret()])], true, 64);
        interpreter.queue_script(0, 0);
        assert_eq!(rig.step(&mut interpreter), Ok(StepOutcome::Yielded));
        assert!(!rig.frame.script_processing);
    }
}
