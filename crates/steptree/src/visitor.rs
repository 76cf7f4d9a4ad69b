//! Depth-first scheduler over a tree of execution sequences.
//!
//! The [`Visitor`] turns a nested tree of tasks into one flat, steppable unit.
//! It keeps the suspended ancestors of the running node on an explicit stack:
//!
//! - A node that asks to descend is pushed, and a fresh instance of the child
//!   becomes the active sequence.
//! - A node that completes is dropped, its parent is popped back into place,
//!   and the status is delivered to the parent on the following step.
//! - A node that raises hands the error to its parent within the same step.
//!   The parent may handle it (as `catch` does) or raise it further. An error
//!   that leaves the root ends the visitor and is returned to the caller.
//!
//! A visitor runs one tree instance once. To run the tree again, build a new
//! visitor from the same [`Task`].

use std::time::Duration;

use crate::{Instance, Params, Resume, Status, Step, StepCtx, Task, TreeError};

/// What one call to [`Visitor::step`] observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Nothing resolved this step.
    Pending,
    /// A node below the root finished. Its parent receives the status next step.
    Ascend(Status),
    /// The root finished. The visitor is exhausted.
    Finished(Status),
}

impl Progress {
    /// The status resolved this step, at any depth.
    pub fn status(self) -> Option<Status> {
        match self {
            Progress::Pending => None,
            Progress::Ascend(status) | Progress::Finished(status) => Some(status),
        }
    }

    /// The final result of the whole tree, if it finished this step.
    pub fn finished(self) -> Option<Status> {
        match self {
            Progress::Finished(status) => Some(status),
            _ => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Progress::Pending)
    }
}

/// Steps one tree instance, one advance cycle per call.
pub struct Visitor<C> {
    params: Params,
    active: Option<Instance<C>>,
    stack: Vec<Instance<C>>,
    delivery: Option<Status>,
    steps: u64,
}

impl<C> Visitor<C> {
    /// Instantiates `root` with the run-time parameters shared by the whole tree.
    pub fn new(root: &Task<C>, params: Params) -> Self {
        let active = root.instantiate(&params);
        Self {
            params,
            active: Some(active),
            stack: Vec::new(),
            delivery: None,
            steps: 0,
        }
    }

    /// Advances the tree by one step.
    ///
    /// # Errors
    ///
    /// - Any error raised in the tree and not handled on the way up
    /// - [`TreeError::VisitorExhausted`] if the tree already finished or failed
    pub fn step(&mut self, target: &mut C, dt: Duration) -> Result<Progress, TreeError> {
        let mut active = self.active.take().ok_or(TreeError::VisitorExhausted)?;
        self.steps += 1;

        let mut cx = StepCtx::new(target, dt);
        let input = match self.delivery.take() {
            Some(status) => Resume::Child(status),
            None => Resume::Continue,
        };
        let mut outcome = active.resume(&mut cx, input);

        loop {
            match outcome {
                Ok(Step::Pending) => {
                    self.active = Some(active);
                    return Ok(Progress::Pending);
                }
                Ok(Step::Descend(child)) => {
                    tracing::trace!(
                        parent = active.name(),
                        child = child.name(),
                        depth = self.stack.len() + 1,
                        "descending"
                    );
                    let child = child.instantiate(&self.params);
                    self.stack.push(active);
                    self.active = Some(child);
                    return Ok(Progress::Pending);
                }
                Ok(Step::Complete(status)) => {
                    let Some(parent) = self.stack.pop() else {
                        tracing::trace!(root = active.name(), ?status, "tree finished");
                        return Ok(Progress::Finished(status));
                    };
                    tracing::trace!(
                        child = active.name(),
                        parent = parent.name(),
                        ?status,
                        "ascending"
                    );
                    self.active = Some(parent);
                    self.delivery = Some(status);
                    return Ok(Progress::Ascend(status));
                }
                Err(err) => {
                    let Some(parent) = self.stack.pop() else {
                        return Err(err);
                    };
                    tracing::trace!(
                        from = active.name(),
                        to = parent.name(),
                        error = %err,
                        "delivering error"
                    );
                    active = parent;
                    outcome = active.resume(&mut cx, Resume::Raised(err));
                }
            }
        }
    }

    /// Steps until the root finishes, collecting every status resolved on the way.
    ///
    /// The last entry is the tree's final result. Errors abort the run.
    pub fn run_to_end(&mut self, target: &mut C, dt: Duration) -> Result<Vec<Status>, TreeError> {
        let mut seen = Vec::new();
        loop {
            let progress = self.step(target, dt)?;
            if let Some(status) = progress.status() {
                seen.push(status);
            }
            if progress.finished().is_some() {
                return Ok(seen);
            }
        }
    }

    /// Number of suspended ancestors of the running node.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Name of the running node, or `None` once the visitor is exhausted.
    pub fn active_task(&self) -> Option<&'static str> {
        self.active.as_ref().map(Instance::name)
    }

    pub fn is_finished(&self) -> bool {
        self.active.is_none()
    }

    /// Number of `step` calls made so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl<C> std::fmt::Debug for Visitor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visitor")
            .field("active", &self.active_task())
            .field("depth", &self.stack.len())
            .field("delivery", &self.delivery)
            .field("steps", &self.steps)
            .finish()
    }
}
