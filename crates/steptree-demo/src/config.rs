//! Demo configuration structures and loaders.
use std::env;
use std::time::Duration;

/// Configuration for one headless simulation run.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub frames: u32,
    pub frame_dt: Duration,
    pub agents: usize,
    pub initial_delay: Duration,
    pub world: WorldConfig,
}

impl DemoConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `DEMO_FRAMES`
    /// - `DEMO_DT_MS`
    /// - `DEMO_AGENTS`
    /// - `DEMO_INITIAL_DELAY_MS`
    /// - `DEMO_HAZARD` / `DEMO_WORLD_LENGTH`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(frames) = read_env::<u32>("DEMO_FRAMES") {
            config.frames = frames;
        }

        if let Some(ms) = read_env::<u64>("DEMO_DT_MS") {
            config.frame_dt = Duration::from_millis(ms.max(1));
        }

        if let Some(agents) = read_env::<usize>("DEMO_AGENTS") {
            config.agents = agents.max(1);
        }

        if let Some(ms) = read_env::<u64>("DEMO_INITIAL_DELAY_MS") {
            config.initial_delay = Duration::from_millis(ms);
        }

        if let Some(length) = read_env::<f64>("DEMO_WORLD_LENGTH") {
            config.world.length = length.max(1.0);
        }

        if let Some(hazard) = read_env::<f64>("DEMO_HAZARD") {
            config.world.hazard = hazard.clamp(0.0, config.world.length);
        }

        config
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            frame_dt: Duration::from_millis(16),
            agents: 4,
            initial_delay: Duration::from_millis(100),
            world: WorldConfig::default(),
        }
    }
}

/// A one-dimensional world: a line with a hazard somewhere on it.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    pub length: f64,
    pub hazard: f64,
    /// Distance at which critters notice the hazard.
    pub alarm_radius: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            length: 100.0,
            hazard: 50.0,
            alarm_radius: 8.0,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
