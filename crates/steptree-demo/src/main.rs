//! Headless host for steptree agents.
mod config;
mod critter;

use anyhow::{Result, ensure};
use steptree::{Agent, AgentConfig, AgentEvent, BlackboardRegistry, Params};

use config::DemoConfig;
use critter::{Critter, critter_tree};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = DemoConfig::from_env();
    ensure!(
        config.world.alarm_radius < config.world.length / 2.0,
        "alarm radius {} does not fit a world of length {}",
        config.world.alarm_radius,
        config.world.length
    );

    let mut registry = BlackboardRegistry::new();
    let world = registry.board("world");
    world.set("hazard", config.world.hazard);
    world.set("alarm_radius", config.world.alarm_radius);
    world.set("length", config.world.length);

    let tree = critter_tree();
    tracing::info!(
        tree = tree.name(),
        doc = tree.doc().unwrap_or_default(),
        agents = config.agents,
        frames = config.frames,
        "starting simulation"
    );

    let agent_config = AgentConfig::new().with_initial_delay(config.initial_delay);
    let mut critters: Vec<Critter> = (0..config.agents)
        .map(|id| Critter::spawn(id, config.agents, config.world.length))
        .collect();
    let mut agents: Vec<Agent<Critter>> = (0..config.agents)
        .map(|_| {
            Agent::new(
                tree.clone(),
                Params::new().with_blackboard(world.clone()),
                agent_config.clone(),
            )
        })
        .collect();

    let mut failures = 0u32;
    for _frame in 0..config.frames {
        for (agent, critter) in agents.iter_mut().zip(critters.iter_mut()) {
            if let AgentEvent::Failed(err) = agent.update(critter, config.frame_dt) {
                failures += 1;
                tracing::warn!(critter = critter.id, error = %err, "critter tree aborted");
            }
        }
    }

    for (agent, critter) in agents.iter().zip(&critters) {
        tracing::info!(
            critter = critter.id,
            position = format_args!("{:.1}", critter.position),
            energy = format_args!("{:.1}", critter.energy),
            runs = agent.runs(),
            fled = critter.stats.fled,
            cornered = critter.stats.cornered,
            rests = critter.stats.rests,
            "critter summary"
        );
    }
    tracing::info!(failures, boards = registry.len(), "simulation finished");

    Ok(())
}
