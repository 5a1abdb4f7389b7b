mod agent;
mod beliefs;
mod coordination;
mod evaluation;
mod explosions;
mod intents;
mod interface;
mod model;
mod params;
mod pathing;
mod valuation;
mod view;

use std::io::{self,Write};
use std::path::PathBuf;

use anyhow::{Context,Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agent::Agent;
use interface::ParseError;
use model::*;
use params::Params;

#[derive(Parser)]
#[command(version, about = "Plays Unleash the Geek over stdin/stdout")]
struct Args {
    /// JSON file overriding the default tuning parameters
    #[arg(long)]
    params: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let params = match args.params {
        Some(path) => Params::load(&path)?,
        None => Params::default(),
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let bounds = interface::read_initial(&mut input).context("failed to read map size")?;
    info!(width = bounds.width, height = bounds.height, "match started");

    let mut agent = Agent::new(bounds, params);
    let mut previous = World::new(bounds);

    // game loop
    loop {
        let mut world = match interface::read_turn(&mut input, &previous) {
            Ok(world) => world,
            Err(ParseError::UnexpectedEof) => break,
            Err(error) => return Err(error).context("failed to read turn"),
        };

        let actions = agent.act(&previous, &world);

        let stdout = io::stdout();
        let mut output = stdout.lock();
        for action in actions.iter() {
            writeln!(output, "{}", interface::format_action(action))?;
        }
        output.flush()?;

        world.actions = actions;
        previous = world;
    }

    info!(tick = previous.tick, "match ended");
    Ok(())
}
