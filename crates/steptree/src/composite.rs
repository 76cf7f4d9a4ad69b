//! Composite nodes.
//!
//! Composites control the execution flow of several children: [`sequence`]
//! (AND logic), [`selector`] (OR logic) and [`parallel`] (all children
//! interleaved, judged by a [`Policy`]).
//!
//! Children are stored as blueprints and instantiated afresh on every run, so
//! a composite can be reused across any number of trees.

use std::rc::Rc;

use crate::{Params, Progress, Resume, Routine, Status, Step, StepCtx, Task, TreeError, Visitor};

/// Runs children in order until one fails.
///
/// # Semantics
///
/// - If a child returns `Failure`, the sequence **stops immediately** and fails
/// - If a child returns `Success`, the sequence **continues** to the next child
/// - If all children succeed (or there are none), the sequence succeeds
///
/// This is analogous to a short-circuited logical AND (&&) operation.
pub fn sequence<C: 'static>(children: Vec<Task<C>>) -> Task<C> {
    ordered("sequence", children, Status::Failure)
}

/// Runs children in order until one succeeds.
///
/// # Semantics
///
/// - If a child returns `Success`, the selector **stops immediately** and succeeds
/// - If a child returns `Failure`, the selector **continues** to the next child
/// - If all children fail (or there are none), the selector fails
///
/// This is analogous to a short-circuited logical OR (||) operation.
pub fn selector<C: 'static>(children: Vec<Task<C>>) -> Task<C> {
    ordered("selector", children, Status::Success)
}

fn ordered<C: 'static>(name: &'static str, children: Vec<Task<C>>, stop_on: Status) -> Task<C> {
    let children: Rc<[Task<C>]> = children.into();
    Task::new(name, move |_params: &Params| Ordered {
        children: Rc::clone(&children),
        next: 0,
        stop_on,
    })
}

struct Ordered<C> {
    children: Rc<[Task<C>]>,
    next: usize,
    stop_on: Status,
}

impl<C> Routine<C> for Ordered<C> {
    fn resume(&mut self, _cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        if let Some(status) = input.received()?
            && status == self.stop_on
        {
            return Ok(Step::Complete(status));
        }

        match self.children.get(self.next) {
            Some(child) => {
                self.next += 1;
                Ok(Step::Descend(child.clone()))
            }
            None => Ok(Step::Complete(self.stop_on.invert())),
        }
    }
}

/// Success policy of a [`parallel`] node.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Policy {
    /// Succeed once every child has succeeded. One failure fails the node.
    #[strum(serialize = "ALL")]
    #[serde(rename = "ALL")]
    RequireAll,

    /// Succeed as soon as one child succeeds. Fail once every child has failed.
    #[default]
    #[strum(serialize = "ONE")]
    #[serde(rename = "ONE")]
    RequireOne,
}

impl Policy {
    /// Parses `"ALL"` or `"ONE"`. Anything else is a configuration error.
    pub fn parse(value: &str) -> Result<Self, TreeError> {
        value
            .parse()
            .map_err(|_| TreeError::config("parallel", format!("unknown success policy `{value}`")))
    }

    /// Result once every child finished without an early decision.
    fn exhausted(self) -> Status {
        match self {
            Policy::RequireAll => Status::Success,
            Policy::RequireOne => Status::Failure,
        }
    }

    /// The child result that decides the node immediately.
    fn decisive(self) -> Status {
        match self {
            Policy::RequireAll => Status::Failure,
            Policy::RequireOne => Status::Success,
        }
    }
}

/// Parameter key that overrides the policy a [`parallel`] node was built with.
pub const POLICY_KEY: &str = "policy";

/// Runs all children side by side until the policy is fulfilled or broken.
///
/// Every own step advances each unfinished child by one step, in declaration
/// order. The policy is evaluated as each child finishes; once it decides,
/// the remaining children are dropped without being advanced further.
///
/// A `"policy"` parameter (`"ALL"` or `"ONE"`) replaces `policy`. It is
/// consumed here and not passed on to the children. Any other value fails the
/// node on its first step with a config error.
pub fn parallel<C: 'static>(children: Vec<Task<C>>, policy: Policy) -> Task<C> {
    let children: Rc<[Task<C>]> = children.into();
    Task::new("parallel", move |params: &Params| {
        let chosen = params
            .get_as::<String>("parallel", POLICY_KEY)
            .and_then(|name| name.map_or(Ok(policy), |name| Policy::parse(&name)));
        let mut inherited = params.clone();
        inherited.remove(POLICY_KEY);

        Parallel {
            branches: children
                .iter()
                .map(|child| Some(Visitor::new(child, inherited.clone())))
                .collect(),
            policy: chosen,
            finished: 0,
        }
    })
}

struct Parallel<C> {
    branches: Vec<Option<Visitor<C>>>,
    policy: Result<Policy, TreeError>,
    finished: usize,
}

impl<C> Routine<C> for Parallel<C> {
    fn resume(&mut self, cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        input.received()?;
        let policy = self.policy.clone()?;
        let total = self.branches.len();

        for (index, slot) in self.branches.iter_mut().enumerate() {
            let Some(branch) = slot else { continue };
            let dt = cx.dt();
            let Progress::Finished(status) = branch.step(cx.target_mut(), dt)? else {
                continue;
            };
            *slot = None;
            self.finished += 1;

            if status == policy.decisive() {
                tracing::debug!(%policy, branch = index, ?status, "parallel decided early");
                return Ok(Step::Complete(status));
            }
        }

        if self.finished == total {
            return Ok(Step::Complete(policy.exhausted()));
        }
        Ok(Step::Pending)
    }
}
