//! Headless host: loads a script pack and optional world records, runs the
//! frame loop on a virtual clock and writes what happened as JSON.

use std::{collections::VecDeque, fs, path::Path};

use anyhow::{Context, Result};
use asylum_formats::{ActionListFile, ActorRecord, ObjectRecord};
use log::{info, warn};
use serde::Serialize;

use crate::actor::Actor;
use crate::audio::{AudioEvent, RecordingMixer};
use crate::cli::RunArgs;
use crate::config::EngineConfig;
use crate::frame::FrameRequest;
use crate::frame_loop::Engine;
use crate::object::Object;
use crate::platform::HeadlessPlatform;
use crate::resources::InMemoryResources;
use crate::scene::Scene;
use crate::script::ScriptQueueEntry;
use crate::services::{EncounterRun, RecordingEncounters, Services};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u32,
    pub stopped_by: Option<FrameRequest>,
    pub frames_presented: usize,
    pub events: usize,
}

#[derive(Serialize)]
struct TickRequests {
    tick: u64,
    requests: Vec<FrameRequest>,
}

#[derive(Serialize)]
struct ActorSummary {
    index: usize,
    status: i32,
    x: i32,
    y: i32,
    direction: i32,
}

#[derive(Serialize)]
struct EventLog<'a> {
    ticks: u32,
    stopped_by: Option<FrameRequest>,
    requests: Vec<TickRequests>,
    events: &'a VecDeque<String>,
    audio: Vec<AudioEvent>,
    encounters: Vec<EncounterRun>,
    flags: Vec<i32>,
    queue_history: &'a VecDeque<ScriptQueueEntry>,
    actors: Vec<ActorSummary>,
}

pub fn execute(args: RunArgs) -> Result<RunSummary> {
    let mut config = EngineConfig::from_json_file(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    if args.lenient {
        config.strict_content_errors = false;
    }

    let resources = InMemoryResources::from_json_file(args.resources.as_deref())?;
    let pack = ActionListFile::open(&args.scripts)?.into_pack();
    info!(
        "loaded {} scripts from {}",
        pack.scripts.len(),
        args.scripts.display()
    );

    let actors = match args.actors.as_deref() {
        Some(path) => load_actors(path)?,
        None => vec![Actor::new(0)],
    };
    let objects = match args.objects.as_deref() {
        Some(path) => load_objects(path)?,
        None => Vec::new(),
    };

    let mixer = RecordingMixer::new();
    let encounters = RecordingEncounters::new();
    let gamma = config.gamma_level;
    let services = Services::new(config, Box::new(resources))
        .with_mixer(Box::new(mixer.clone()))
        .with_encounters(Box::new(encounters.clone()));
    let scene = Scene::new(gamma).with_actors(actors).with_objects(objects);
    let mut engine = Engine::new(scene, services, pack.scripts);

    for entry in &args.queue {
        if !engine.queue_script(entry.script_index, entry.actor_index) {
            warn!(
                "script {} for actor {} is already queued",
                entry.script_index, entry.actor_index
            );
        }
    }

    let mut platform = HeadlessPlatform::new();
    let mut requests = Vec::new();
    let mut stopped_by = None;
    let mut ticks = 0;
    while ticks < args.ticks {
        let report = engine.tick(&mut platform)?;
        ticks += 1;
        // Encounters have no host here; each ends after the frame that started it.
        encounters.finish();
        platform.advance(args.tick_ms);

        stopped_by = report.requests.iter().copied().find(|request| {
            matches!(
                request,
                FrameRequest::Quit | FrameRequest::ChangeScene { .. }
            )
        });
        if !report.requests.is_empty() {
            requests.push(TickRequests {
                tick: report.tick,
                requests: report.requests,
            });
        }
        if stopped_by.is_some() {
            break;
        }
    }

    let summary = RunSummary {
        ticks,
        stopped_by,
        frames_presented: platform.frames_presented(),
        events: engine.scene.events.len(),
    };

    if let Some(path) = args.events_out.as_deref() {
        let log = EventLog {
            ticks,
            stopped_by,
            requests,
            events: &engine.scene.events,
            audio: mixer.events(),
            encounters: encounters.runs(),
            flags: engine.scene.world.flags.iter().collect(),
            queue_history: engine.interpreter.queue().history(),
            actors: engine
                .scene
                .actors
                .iter()
                .map(|actor| ActorSummary {
                    index: actor.index,
                    status: actor.status.as_i32(),
                    x: actor.x,
                    y: actor.y,
                    direction: actor.direction,
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&log).context("serializing event log to JSON")?;
        fs::write(path, &json)
            .with_context(|| format!("writing event log to {}", path.display()))?;
        println!("Saved event log to {}", path.display());
    }

    Ok(summary)
}

fn load_actors(path: &Path) -> Result<Vec<Actor>> {
    let bytes =
        fs::read(path).with_context(|| format!("reading actor table {}", path.display()))?;
    let records = ActorRecord::parse_table(&bytes)
        .with_context(|| format!("parsing actor table {}", path.display()))?;
    Ok(records
        .iter()
        .enumerate()
        .map(|(index, record)| Actor::from_record(index, record))
        .collect())
}

fn load_objects(path: &Path) -> Result<Vec<Object>> {
    let bytes =
        fs::read(path).with_context(|| format!("reading object table {}", path.display()))?;
    let records = ObjectRecord::parse_table(&bytes)
        .with_context(|| format!("parsing object table {}", path.display()))?;
    Ok(records.iter().map(Object::from_record).collect())
}
