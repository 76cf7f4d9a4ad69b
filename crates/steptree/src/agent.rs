//! Host-side driver for one tree instance.
//!
//! An [`Agent`] is what a host application keeps per entity: the tree
//! blueprint, the run-time parameters bound to it and the live visitor. The
//! host calls [`Agent::update`] once per world update with the frame's elapsed
//! time. The agent:
//!
//! - waits out an optional initial delay before the first step
//! - publishes the frame delta on the bound blackboard (seconds, `f64`)
//! - steps the visitor once
//! - starts a fresh run when the tree finishes, if configured to
//! - reports uncaught errors through `tracing` and carries on with a fresh run
//!   instead of taking the host down

use std::time::Duration;

use crate::{Params, Progress, Status, Task, TreeError, Visitor};

/// Tunable behaviour of an [`Agent`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AgentConfig {
    /// Time to wait before the tree is stepped for the first time.
    pub initial_delay: Duration,

    /// Start a new run after the tree finishes or raises.
    pub restart: bool,

    /// Blackboard key receiving the frame delta. `None` disables publishing.
    pub dt_key: Option<String>,
}

impl AgentConfig {
    pub const DEFAULT_DT_KEY: &'static str = "dt";

    pub fn new() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            restart: true,
            dt_key: Some(Self::DEFAULT_DT_KEY.to_string()),
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    #[must_use]
    pub fn with_dt_key(mut self, key: Option<String>) -> Self {
        self.dt_key = key;
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened during one [`Agent::update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentEvent {
    /// Still inside the initial delay. The tree was not stepped.
    Waiting,
    /// The tree was stepped and has not finished.
    Running,
    /// The tree finished a run with this result.
    Finished(Status),
    /// The tree raised an error nothing handled. The run was abandoned.
    Failed(TreeError),
    /// The tree finished earlier and restarting is disabled.
    Idle,
}

/// Drives one tree instance on behalf of a host entity.
pub struct Agent<C> {
    tree: Task<C>,
    params: Params,
    config: AgentConfig,
    visitor: Option<Visitor<C>>,
    delay_left: Duration,
    runs: u64,
    last_status: Option<Status>,
}

impl<C> Agent<C> {
    pub fn new(tree: Task<C>, params: Params, config: AgentConfig) -> Self {
        let visitor = Some(Visitor::new(&tree, params.clone()));
        Self {
            delay_left: config.initial_delay,
            tree,
            params,
            config,
            visitor,
            runs: 0,
            last_status: None,
        }
    }

    /// Advances the agent by one world update.
    pub fn update(&mut self, target: &mut C, dt: Duration) -> AgentEvent {
        if !self.delay_left.is_zero() {
            if dt < self.delay_left {
                self.delay_left -= dt;
                return AgentEvent::Waiting;
            }
            self.delay_left = Duration::ZERO;
        }

        let Some(visitor) = self.visitor.as_mut() else {
            return AgentEvent::Idle;
        };

        if let (Some(key), Some(board)) = (&self.config.dt_key, self.params.blackboard()) {
            board.set(key.as_str(), dt.as_secs_f64());
        }

        match visitor.step(target, dt) {
            Ok(Progress::Finished(status)) => {
                self.runs += 1;
                self.last_status = Some(status);
                tracing::debug!(tree = self.tree.name(), run = self.runs, ?status, "run finished");
                self.start_next_run();
                AgentEvent::Finished(status)
            }
            Ok(Progress::Pending | Progress::Ascend(_)) => AgentEvent::Running,
            Err(err) => {
                self.runs += 1;
                self.last_status = None;
                tracing::error!(tree = self.tree.name(), run = self.runs, error = %err, "run aborted by uncaught error");
                self.start_next_run();
                AgentEvent::Failed(err)
            }
        }
    }

    fn start_next_run(&mut self) {
        self.visitor = self
            .config
            .restart
            .then(|| Visitor::new(&self.tree, self.params.clone()));
    }

    /// Abandons the current run and starts over, initial delay included.
    pub fn reset(&mut self) {
        self.visitor = Some(Visitor::new(&self.tree, self.params.clone()));
        self.delay_left = self.config.initial_delay;
    }

    /// Number of runs that finished or were aborted.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Result of the most recent run that finished normally.
    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn is_idle(&self) -> bool {
        self.visitor.is_none()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tree(&self) -> &Task<C> {
        &self.tree
    }
}
