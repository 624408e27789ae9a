use anyhow::Result;
use asylum_engine::{cli, runtime};

fn main() -> Result<()> {
    let args = cli::parse()?;
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let summary = runtime::execute(args)?;
    let stopped = match summary.stopped_by {
        Some(request) => format!("{request:?}"),
        None => "tick limit".to_string(),
    };
    println!(
        "Ran {} ticks ({} frames presented, {} events); stopped by {stopped}",
        summary.ticks, summary.frames_presented, summary.events
    );
    Ok(())
}
