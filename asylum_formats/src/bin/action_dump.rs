use std::path::PathBuf;

use anyhow::{Context, Result};
use asylum_formats::{ActionListFile, ScriptCommand};
use clap::Parser;
use serde::Serialize;

/// Inspect an action list and print the used lines of every script.
#[derive(Parser)]
struct Args {
    /// Path to the action list to inspect
    path: PathBuf,

    /// Emit the decoded scripts as JSON instead of a listing
    #[arg(long)]
    json: bool,

    /// Only show this script index
    #[arg(long)]
    script: Option<usize>,
}

#[derive(Serialize)]
struct ScriptListing<'a> {
    index: usize,
    value: i32,
    counter: i32,
    commands: &'a [ScriptCommand],
}

fn used_lines(commands: &[ScriptCommand]) -> &[ScriptCommand] {
    let used = commands
        .iter()
        .rposition(|command| *command != ScriptCommand::default())
        .map(|last| last + 1)
        .unwrap_or(0);
    &commands[..used]
}

fn main() -> Result<()> {
    let args = Args::parse();
    let file = ActionListFile::open(&args.path)?;
    let scripts = &file.pack().scripts;

    let selected: Vec<ScriptListing> = scripts
        .iter()
        .enumerate()
        .filter(|(index, _)| args.script.is_none_or(|wanted| wanted == *index))
        .map(|(index, script)| ScriptListing {
            index,
            value: script.value,
            counter: script.counter,
            commands: used_lines(&script.commands),
        })
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&selected).context("serializing scripts")?;
        println!("{json}");
        return Ok(());
    }

    println!("{} scripts in {}", scripts.len(), file.path().display());
    for listing in selected {
        println!(
            "script {:>4}  value {:>6}  counter {:>4}",
            listing.index, listing.value, listing.counter
        );
        for (line, command) in listing.commands.iter().enumerate() {
            println!(
                "  {line:>3}  op {opcode:#04x}  {params:?}",
                opcode = command.opcode,
                params = command.params
            );
        }
    }

    Ok(())
}
