//! Critters: the demo's host entities and the tree that drives them.
//!
//! A critter wanders along a line, flees when it gets close to the hazard and
//! rests when it runs low on energy. World facts (hazard position, alarm
//! radius, world length) are read from the shared `world` blackboard.

use std::time::Duration;

use steptree::{
    Catch, Params, Status, Step, StepCtx, Task, TreeError, action, catch, condition, leaf, limit,
    log, repeat_until_succeed, selector, sequence,
};

const WANDER_SPEED: f64 = 6.0;
const FLEE_SPEED: f64 = 14.0;
const MAX_ENERGY: f64 = 10.0;
const TIRED_BELOW: f64 = 2.0;
const REST_GAIN: f64 = 2.5;
const REST_PERIOD: Duration = Duration::from_millis(250);

/// Error category raised when a fleeing critter hits the edge of the world.
pub const CORNERED: &str = "cornered";

#[derive(Clone, Copy, Debug, Default)]
pub struct CritterStats {
    pub fled: u32,
    pub cornered: u32,
    pub rests: u32,
}

#[derive(Clone, Debug)]
pub struct Critter {
    pub id: usize,
    pub position: f64,
    pub heading: f64,
    pub energy: f64,
    pub stats: CritterStats,
}

impl Critter {
    /// Spreads `count` critters evenly along a line of `length`, alternating headings.
    pub fn spawn(id: usize, count: usize, length: f64) -> Self {
        let spacing = length / (count as f64 + 1.0);
        Self {
            id,
            position: spacing * (id as f64 + 1.0),
            heading: if id % 2 == 0 { 1.0 } else { -1.0 },
            energy: MAX_ENERGY,
            stats: CritterStats::default(),
        }
    }
}

fn world_value(params: &Params, task: &'static str, key: &str) -> Result<f64, TreeError> {
    params
        .require_blackboard(task)?
        .get(key)
        .and_then(|value| value.as_f64())
        .ok_or_else(|| TreeError::MissingParam {
            task,
            key: key.to_string(),
        })
}

fn near_hazard() -> Task<Critter> {
    leaf("near_hazard", |cx: &mut StepCtx<'_, Critter>, params: &Params| {
        let hazard = world_value(params, "near_hazard", "hazard")?;
        let radius = world_value(params, "near_hazard", "alarm_radius")?;
        Ok(Step::done((cx.target().position - hazard).abs() < radius))
    })
}

/// Runs away from the hazard until out of range. Raises `cornered` at the world's edge.
fn run_away() -> Task<Critter> {
    leaf("run_away", |cx: &mut StepCtx<'_, Critter>, params: &Params| {
        let hazard = world_value(params, "run_away", "hazard")?;
        let radius = world_value(params, "run_away", "alarm_radius")?;
        let length = world_value(params, "run_away", "length")?;
        let dt = cx.dt().as_secs_f64();

        let critter = cx.target_mut();
        let away = if critter.position >= hazard { 1.0 } else { -1.0 };
        critter.heading = away;
        critter.position += away * FLEE_SPEED * dt;
        critter.energy = (critter.energy - 2.0 * dt).max(0.0);

        if critter.position <= 0.0 || critter.position >= length {
            critter.position = critter.position.clamp(0.0, length);
            return Err(TreeError::raise(CORNERED, format!("critter {} hit the edge", critter.id)));
        }
        if (critter.position - hazard).abs() >= radius {
            critter.stats.fled += 1;
            return Ok(Step::Complete(Status::Success));
        }
        Ok(Step::Pending)
    })
}

fn cower() -> Task<Critter> {
    action("cower", |critter: &mut Critter| {
        critter.stats.cornered += 1;
        critter.heading = -critter.heading;
        Status::Success
    })
}

fn rest() -> Task<Critter> {
    action("rest", |critter: &mut Critter| {
        critter.stats.rests += 1;
        critter.energy = (critter.energy + REST_GAIN).min(MAX_ENERGY);
        Status::from(critter.energy >= MAX_ENERGY)
    })
}

fn wander() -> Task<Critter> {
    leaf("wander", |cx: &mut StepCtx<'_, Critter>, params: &Params| {
        let length = world_value(params, "wander", "length")?;
        let dt = cx.dt().as_secs_f64();

        let critter = cx.target_mut();
        critter.position += critter.heading * WANDER_SPEED * dt;
        if critter.position <= 0.0 || critter.position >= length {
            critter.position = critter.position.clamp(0.0, length);
            critter.heading = -critter.heading;
        }
        critter.energy = (critter.energy - dt).max(0.0);
        Ok(Step::Complete(Status::Success))
    })
}

/// The full decision tree: flee, else rest when tired, else wander.
pub fn critter_tree() -> Task<Critter> {
    let flee = log(
        sequence(vec![
            near_hazard(),
            catch(run_away(), Catch::new().caught(CORNERED).branch(cower())),
        ]),
        "flee",
    );
    let recover = sequence(vec![
        condition("is_tired", |critter: &Critter| critter.energy < TIRED_BELOW),
        repeat_until_succeed(limit(rest(), REST_PERIOD), Status::Success),
    ]);
    selector(vec![flee, recover, wander()])
        .with_doc("Flee the hazard, rest when tired, otherwise wander.")
}
