//! Opcode handlers, grouped by what they act on.

pub mod actor;
pub mod flags;
pub mod flow;
pub mod object;
pub mod scene;
pub mod sound;

#[cfg(test)]
pub(crate) mod testing {
    use asylum_formats::{ScriptCommand, ScriptRecord};

    use crate::actor::Actor;
    use crate::audio::RecordingMixer;
    use crate::config::EngineConfig;
    use crate::error::ContentResult;
    use crate::frame::FrameContext;
    use crate::platform::HeadlessPlatform;
    use crate::resources::InMemoryResources;
    use crate::scene::Scene;
    use crate::script::command::{Control, OpContext};
    use crate::script::queue::ScriptQueue;
    use crate::script::state::{CommandState, ScriptVars};
    use crate::services::{RecordingEncounters, Services};

    /// Owns everything an [`OpContext`] borrows, so handlers can be called
    /// directly line by line.
    pub struct OpRig {
        pub scene: Scene,
        pub services: Services,
        pub frame: FrameContext,
        pub platform: HeadlessPlatform,
        pub state: CommandState,
        pub vars: ScriptVars,
        pub queue: ScriptQueue,
        pub script: ScriptRecord,
        pub actor_index: i32,
        pub mixer: RecordingMixer,
        pub encounters: RecordingEncounters,
    }

    impl OpRig {
        pub fn new() -> Self {
            Self::with_resources(InMemoryResources::new())
        }

        pub fn with_resources(resources: InMemoryResources) -> Self {
            let mixer = RecordingMixer::new();
            let encounters = RecordingEncounters::new();
            let services = Services::new(EngineConfig::default(), Box::new(resources))
                .with_mixer(Box::new(mixer.clone()))
                .with_encounters(Box::new(encounters.clone()));
            OpRig {
                scene: Scene::new(0).with_actors((0..4).map(Actor::new).collect()),
                services,
                frame: FrameContext::new(),
                platform: HeadlessPlatform::new(),
                state: CommandState::default(),
                vars: ScriptVars::default(),
                queue: ScriptQueue::new(),
                script: ScriptRecord::new(vec![ScriptCommand::new(0x00, &[])]),
                actor_index: 0,
                mixer,
                encounters,
            }
        }

        /// Runs `handler` once. The line state carries over between calls
        /// the way it does between ticks.
        pub fn run(
            &mut self,
            handler: fn(&mut OpContext<'_>, &ScriptCommand) -> ContentResult<Control>,
            opcode: i32,
            params: &[i32],
        ) -> ContentResult<Control> {
            let command = ScriptCommand::new(opcode, params);
            let mut ctx = OpContext {
                scene: &mut self.scene,
                services: &mut self.services,
                frame: &mut self.frame,
                platform: &mut self.platform,
                state: &mut self.state,
                vars: &mut self.vars,
                queue: &mut self.queue,
                script: &self.script,
                script_index: 0,
                line: 0,
                actor_index: self.actor_index,
            };
            handler(&mut ctx, &command)
        }
    }
}
