use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Headless runner that steps action-list scripts through the frame loop",
    version
)]
pub struct Args {
    /// Script pack to load (action-list binary)
    #[arg(long)]
    pub scripts: PathBuf,

    /// Optional table of fixed-size actor records
    #[arg(long)]
    pub actors: Option<PathBuf>,

    /// Optional table of fixed-size object records
    #[arg(long)]
    pub objects: Option<PathBuf>,

    /// Optional JSON manifest of graphics, palettes and speech lines
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// Optional JSON engine config; missing fields keep their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames to run before stopping
    #[arg(long, default_value_t = 100)]
    pub ticks: u32,

    /// Virtual milliseconds between two frames
    #[arg(long, default_value_t = 55)]
    pub tick_ms: u64,

    /// Script to queue before the first frame, as SCRIPT[:ACTOR] (repeatable)
    #[arg(long = "queue", value_name = "SCRIPT[:ACTOR]", value_parser = parse_queue_entry)]
    pub queue: Vec<QueueEntry>,

    /// Path to write the JSON event log
    #[arg(long)]
    pub events_out: Option<PathBuf>,

    /// Log every executed opcode
    #[arg(long)]
    pub verbose: bool,

    /// End faulty scripts with an error log instead of stopping the run
    #[arg(long)]
    pub lenient: bool,

    /// Override the random seed from the config
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub script_index: i32,
    pub actor_index: i32,
}

#[derive(Debug)]
pub struct RunArgs {
    pub scripts: PathBuf,
    pub actors: Option<PathBuf>,
    pub objects: Option<PathBuf>,
    pub resources: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub ticks: u32,
    pub tick_ms: u64,
    pub queue: Vec<QueueEntry>,
    pub events_out: Option<PathBuf>,
    pub verbose: bool,
    pub lenient: bool,
    pub seed: Option<u64>,
}

pub fn parse() -> Result<RunArgs> {
    let args = Args::parse();
    args.into_run_args()
}

impl Args {
    fn into_run_args(self) -> Result<RunArgs> {
        if self.ticks == 0 {
            bail!("--ticks must be at least 1");
        }
        if self.tick_ms == 0 {
            bail!("--tick-ms must be at least 1");
        }

        Ok(RunArgs {
            scripts: self.scripts,
            actors: self.actors,
            objects: self.objects,
            resources: self.resources,
            config: self.config,
            ticks: self.ticks,
            tick_ms: self.tick_ms,
            queue: self.queue,
            events_out: self.events_out,
            verbose: self.verbose,
            lenient: self.lenient,
            seed: self.seed,
        })
    }
}

fn parse_queue_entry(raw: &str) -> Result<QueueEntry> {
    let (script, actor) = match raw.split_once(':') {
        Some((script, actor)) => (script, Some(actor)),
        None => (raw, None),
    };
    let script_index = script
        .trim()
        .parse::<i32>()
        .with_context(|| format!("invalid script index in {raw:?}"))?;
    let actor_index = match actor {
        Some(actor) => actor
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid actor index in {raw:?}"))?,
        None => 0,
    };
    if script_index < 0 {
        bail!("script index must not be negative: {raw:?}");
    }
    Ok(QueueEntry {
        script_index,
        actor_index,
    })
}
