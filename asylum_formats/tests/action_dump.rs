use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use asylum_formats::{ActionListPack, MAX_ACTION_COMMANDS, ScriptCommand, ScriptRecord};
use serde::Deserialize;
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct Listing {
    index: usize,
    value: i32,
    counter: i32,
    commands: Vec<ScriptCommand>,
}

fn sample_pack() -> ActionListPack {
    let mut intro = ScriptRecord::new(vec![
        ScriptCommand::new(0x07, &[219]),
        ScriptCommand::new(0x2D, &[0x0100_0002, 0]),
        ScriptCommand::new(0x00, &[]),
    ]);
    intro.value = 42;
    let mut looping = ScriptRecord::new(vec![ScriptCommand::new(0x3C, &[5, 1])]);
    looping.counter = 3;
    ActionListPack {
        declared_size: 0,
        scripts: vec![intro, looping],
    }
}

fn run_dump(args: &[&str]) -> Result<String> {
    let output = Command::new(env!("CARGO_BIN_EXE_action_dump"))
        .args(args)
        .output()
        .context("running action_dump")?;
    assert!(
        output.status.success(),
        "action_dump failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8(output.stdout)?)
}

#[test]
fn json_listing_trims_unused_lines() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("actions.bin");
    fs::write(&path, sample_pack().encode()?)?;

    let stdout = run_dump(&[path.to_str().context("utf-8 path")?, "--json"])?;
    let listings: Vec<Listing> = serde_json::from_str(&stdout)?;
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].value, 42);
    assert_eq!(listings[0].commands.len(), 2, "trailing Return lines are unused slots");
    assert_eq!(listings[0].commands[1].params[0], 0x0100_0002);
    assert_eq!(listings[1].counter, 3);
    assert_eq!(listings[1].commands[0].opcode, 0x3C);
    Ok(())
}

#[test]
fn script_filter_selects_one_listing() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("actions.bin");
    fs::write(&path, sample_pack().encode()?)?;

    let stdout = run_dump(&[path.to_str().context("utf-8 path")?, "--json", "--script", "1"])?;
    let listings: Vec<Listing> = serde_json::from_str(&stdout)?;
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].index, 1);
    Ok(())
}

#[test]
fn truncated_pack_is_reported() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.bin");
    let bytes = sample_pack().encode()?;
    fs::write(&path, &bytes[..bytes.len() - 4])?;

    let output = Command::new(env!("CARGO_BIN_EXE_action_dump"))
        .arg(&path)
        .output()
        .context("running action_dump")?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("truncated"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn encoded_pack_pads_every_script() -> Result<()> {
    let pack = sample_pack();
    let parsed = ActionListPack::parse_bytes(&pack.encode()?)?;
    assert!(parsed
        .scripts
        .iter()
        .all(|script| script.commands.len() == MAX_ACTION_COMMANDS));
    assert_eq!(parsed.scripts[0].commands[..3], pack.scripts[0].commands[..]);
    Ok(())
}
