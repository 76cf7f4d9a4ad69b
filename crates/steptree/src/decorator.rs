//! Decorator nodes.
//!
//! Decorators wrap a single child and change its result or its timing:
//! [`identity`], [`flip`] (NOT logic), the repeat family, [`limit`] (rate
//! limiting), [`catch`] (error handling) and [`log`] (tracing).

use std::rc::Rc;
use std::time::Duration;

use crate::{
    ErrorCategory, Params, Progress, Resume, Routine, Status, Step, StepCtx, Task, TreeError,
    Visitor, fail,
};

/// What a decorator does once its child finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
    Finish(Status),
    /// Run a fresh instance of the child.
    Restart,
}

type Judge = Rc<dyn Fn(Status) -> Verdict>;

fn decorate<C: 'static>(name: &'static str, child: Task<C>, judge: Judge) -> Task<C> {
    Task::new(name, move |_params: &Params| Decorated {
        child: child.clone(),
        judge: Rc::clone(&judge),
        started: false,
    })
}

struct Decorated<C> {
    child: Task<C>,
    judge: Judge,
    started: bool,
}

impl<C> Routine<C> for Decorated<C> {
    fn resume(&mut self, _cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        match input.received()? {
            None if !self.started => {
                self.started = true;
                Ok(Step::Descend(self.child.clone()))
            }
            None => Ok(Step::Pending),
            Some(status) => match (self.judge)(status) {
                Verdict::Finish(status) => Ok(Step::Complete(status)),
                Verdict::Restart => Ok(Step::Descend(self.child.clone())),
            },
        }
    }
}

/// Runs the child and passes its result on unchanged.
pub fn identity<C: 'static>(child: Task<C>) -> Task<C> {
    decorate("identity", child, Rc::new(Verdict::Finish))
}

/// Inverts the child's terminal result. Pending steps pass through.
pub fn flip<C: 'static>(child: Task<C>) -> Task<C> {
    decorate("flip", child, Rc::new(|status: Status| Verdict::Finish(status.invert())))
}

/// Restarts the child after every success; once it fails, finishes with `final_status`.
pub fn repeat_until_fail<C: 'static>(child: Task<C>, final_status: Status) -> Task<C> {
    decorate(
        "repeat_until_fail",
        child,
        Rc::new(move |status: Status| match status {
            Status::Success => Verdict::Restart,
            Status::Failure => Verdict::Finish(final_status),
        }),
    )
}

/// Restarts the child after every failure; once it succeeds, finishes with `final_status`.
pub fn repeat_until_succeed<C: 'static>(child: Task<C>, final_status: Status) -> Task<C> {
    decorate(
        "repeat_until_succeed",
        child,
        Rc::new(move |status: Status| match status {
            Status::Success => Verdict::Finish(final_status),
            Status::Failure => Verdict::Restart,
        }),
    )
}

/// Restarts the child forever. Never finishes.
pub fn repeat_always<C: 'static>(child: Task<C>) -> Task<C> {
    decorate("repeat_always", child, Rc::new(|_status: Status| Verdict::Restart))
}

/// Passes results through unchanged and records each one as a tracing event.
pub fn log<C: 'static>(child: Task<C>, label: impl Into<String>) -> Task<C> {
    let label: Rc<str> = Rc::from(label.into());
    decorate(
        "log",
        child,
        Rc::new(move |status: Status| {
            tracing::info!(label = %label, ?status, "child finished");
            Verdict::Finish(status)
        }),
    )
}

/// Lets the child advance at most once per `period` of accumulated step time.
///
/// Between advances the node reports pending without touching the child.
/// When the child does advance, it sees the time elapsed since its previous
/// advance as its step delta.
pub fn limit<C: 'static>(child: Task<C>, period: Duration) -> Task<C> {
    Task::new("limit", move |params: &Params| Limit {
        branch: Visitor::new(&child, params.clone()),
        period,
        budget: Duration::ZERO,
        since_advance: Duration::ZERO,
    })
}

struct Limit<C> {
    branch: Visitor<C>,
    period: Duration,
    budget: Duration,
    since_advance: Duration,
}

impl<C> Routine<C> for Limit<C> {
    fn resume(&mut self, cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        input.received()?;
        self.budget = self.budget.saturating_add(cx.dt());
        self.since_advance = self.since_advance.saturating_add(cx.dt());
        if self.budget < self.period {
            return Ok(Step::Pending);
        }
        self.budget -= self.period;

        let dt = std::mem::take(&mut self.since_advance);
        match self.branch.step(cx.target_mut(), dt)? {
            Progress::Finished(status) => Ok(Step::Complete(status)),
            Progress::Pending | Progress::Ascend(_) => Ok(Step::Pending),
        }
    }
}

/// Configuration of a [`catch`] node.
pub struct Catch<C> {
    /// Category to intercept. `None` intercepts every raised error.
    pub caught: Option<ErrorCategory>,
    /// Task to run in place of the child once an error is intercepted.
    pub branch: Task<C>,
}

impl<C: 'static> Catch<C> {
    /// Intercepts every raised error and substitutes `fail`.
    pub fn new() -> Self {
        Self {
            caught: None,
            branch: fail(),
        }
    }

    #[must_use]
    pub fn caught(mut self, category: impl Into<ErrorCategory>) -> Self {
        self.caught = Some(category.into());
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: Task<C>) -> Self {
        self.branch = branch;
        self
    }
}

impl<C: 'static> Default for Catch<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Catch<C> {
    fn handles(&self, err: &TreeError) -> bool {
        err.category()
            .is_some_and(|category| self.caught.as_ref().is_none_or(|want| want == category))
    }
}

/// Runs the child; if it raises a matching error, runs the configured branch instead.
///
/// Errors of other categories, structural errors and errors raised by the
/// branch itself propagate unchanged.
pub fn catch<C: 'static>(child: Task<C>, config: Catch<C>) -> Task<C> {
    let config = Rc::new(config);
    Task::new("catch", move |_params: &Params| Catching {
        child: child.clone(),
        config: Rc::clone(&config),
        phase: CatchPhase::Ready,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CatchPhase {
    Ready,
    Child,
    Branch,
}

struct Catching<C> {
    child: Task<C>,
    config: Rc<Catch<C>>,
    phase: CatchPhase,
}

impl<C> Routine<C> for Catching<C> {
    fn resume(&mut self, _cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        match input {
            Resume::Continue if self.phase == CatchPhase::Ready => {
                self.phase = CatchPhase::Child;
                Ok(Step::Descend(self.child.clone()))
            }
            Resume::Continue => Ok(Step::Pending),
            Resume::Child(status) => Ok(Step::Complete(status)),
            Resume::Raised(err) if self.phase == CatchPhase::Child && self.config.handles(&err) => {
                tracing::debug!(error = %err, branch = self.config.branch.name(), "caught error");
                self.phase = CatchPhase::Branch;
                Ok(Step::Descend(self.config.branch.clone()))
            }
            Resume::Raised(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{action, sequence, succeed, succeed_after, throw};

    const DT: Duration = Duration::from_millis(100);

    fn statuses(tree: &Task<u32>, counter: &mut u32) -> Result<Vec<Status>, TreeError> {
        Visitor::new(tree, Params::new()).run_to_end(counter, DT)
    }

    /// Succeeds until the counter reaches `limit`, then fails.
    fn count_below(limit: u32) -> Task<u32> {
        action("count_below", move |count: &mut u32| {
            *count += 1;
            Status::from(*count < limit)
        })
    }

    #[test]
    fn identity_passes_results_through() {
        let mut count = 0;
        assert_eq!(
            statuses(&identity(succeed()), &mut count),
            Ok(vec![Status::Success, Status::Success])
        );
        assert_eq!(
            statuses(&identity(fail()), &mut count),
            Ok(vec![Status::Failure, Status::Failure])
        );
    }

    #[test]
    fn flip_inverts_terminal_results() {
        let mut count = 0;
        assert_eq!(
            statuses(&flip(succeed()), &mut count),
            Ok(vec![Status::Success, Status::Failure])
        );

        let mut visitor = Visitor::new(&flip(succeed_after(1)), Params::new());
        assert_eq!(visitor.step(&mut count, DT), Ok(Progress::Pending));
        assert_eq!(visitor.step(&mut count, DT), Ok(Progress::Pending));
        assert_eq!(visitor.step(&mut count, DT), Ok(Progress::Ascend(Status::Success)));
        assert_eq!(visitor.step(&mut count, DT), Ok(Progress::Finished(Status::Failure)));
    }

    #[test]
    fn repeat_until_fail_restarts_fresh_children() {
        let mut count = 0;
        let result = statuses(&repeat_until_fail(count_below(4), Status::Success), &mut count).unwrap();
        assert_eq!(count, 4);
        assert_eq!(result.last(), Some(&Status::Success));
    }

    #[test]
    fn repeat_until_succeed_stops_on_first_success() {
        let mut count = 0;
        let tree = repeat_until_succeed(flip(count_below(3)), Status::Failure);
        let result = statuses(&tree, &mut count).unwrap();
        assert_eq!(count, 3);
        assert_eq!(result.last(), Some(&Status::Failure));
    }

    #[test]
    fn repeat_always_never_finishes() {
        let mut count = 0;
        let mut visitor = Visitor::new(&repeat_always(count_below(2)), Params::new());
        for _ in 0..30 {
            let progress = visitor.step(&mut count, DT).unwrap();
            assert!(progress.finished().is_none());
        }
        assert_eq!(count, 15);
    }

    #[test]
    fn limit_gates_child_by_accumulated_time() {
        let mut count = 0;
        let tree = limit(repeat_always(count_below(u32::MAX)), Duration::from_millis(250));
        let mut visitor = Visitor::new(&tree, Params::new());

        // 100ms per step: advances happen on steps 3, 5, 8, 10
        let mut advanced_at = Vec::new();
        let mut observed = 0;
        for step in 1..=10 {
            visitor.step(&mut count, DT).unwrap();
            // repeat_always alternates descend / complete, so count moves every other advance
            if count != observed {
                observed = count;
                advanced_at.push(step);
            }
        }
        assert_eq!(advanced_at, vec![5, 10]);
    }

    #[test]
    fn limit_finishes_with_child_result() {
        let mut count = 0;
        let tree = limit(count_below(1), Duration::from_millis(200));
        let mut visitor = Visitor::new(&tree, Params::new());
        assert_eq!(visitor.step(&mut count, DT), Ok(Progress::Pending));
        assert_eq!(count, 0);
        assert_eq!(visitor.step(&mut count, DT), Ok(Progress::Finished(Status::Failure)));
        assert_eq!(count, 1);
    }

    #[test]
    fn limit_saturates_huge_frame_deltas() {
        let mut count = 0;
        let tree = limit(succeed_after(5), Duration::from_secs(1));
        let mut visitor = Visitor::new(&tree, Params::new());
        assert_eq!(visitor.step(&mut count, Duration::MAX), Ok(Progress::Pending));
        assert_eq!(visitor.step(&mut count, Duration::MAX), Ok(Progress::Pending));
        assert_eq!(visitor.step(&mut count, Duration::MAX), Ok(Progress::Pending));
    }

    #[test]
    fn catch_substitutes_the_branch_for_matching_errors() {
        let mut count = 0;
        let tree = catch(
            throw("blocked", "door locked"),
            Catch::new().caught("blocked").branch(succeed()),
        );
        assert_eq!(
            statuses(&tree, &mut count),
            Ok(vec![Status::Success, Status::Success])
        );
    }

    #[test]
    fn catch_reaches_errors_raised_deep_below() {
        let mut count = 0;
        let tree = catch(
            sequence(vec![count_below(10), identity(throw("blocked", ""))]),
            Catch::new().branch(count_below(10)),
        );
        let result = statuses(&tree, &mut count).unwrap();
        assert_eq!(result.last(), Some(&Status::Success));
        assert_eq!(count, 2);
    }

    #[test]
    fn catch_lets_other_categories_through() {
        let mut count = 0;
        let tree = catch(
            throw("blocked", "door locked"),
            Catch::new().caught("starving").branch(succeed()),
        );
        assert_eq!(
            statuses(&tree, &mut count),
            Err(TreeError::raise("blocked", "door locked"))
        );
    }

    #[test]
    fn errors_from_the_branch_propagate() {
        let mut count = 0;
        let tree = catch(throw("first", ""), Catch::new().branch(throw("second", "")));
        assert_eq!(statuses(&tree, &mut count), Err(TreeError::raise("second", "")));
    }

    #[test]
    fn catch_without_error_returns_child_result() {
        let mut count = 0;
        let tree = catch(fail(), Catch::new().branch(succeed()));
        assert_eq!(statuses(&tree, &mut count).unwrap().last(), Some(&Status::Failure));
    }

    #[test]
    fn log_passes_results_through() {
        let mut count = 0;
        assert_eq!(
            statuses(&log(succeed(), "probe"), &mut count),
            Ok(vec![Status::Success, Status::Success])
        );
    }
}
