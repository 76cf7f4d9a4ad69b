//! Task factories and the execution sequences they produce.
//!
//! A [`Task`] is a reusable blueprint. Building a tree only wires blueprints
//! together; nothing runs until a [`Visitor`](crate::Visitor) instantiates the
//! root. Every instantiation yields a fresh [`Instance`] with its own progress,
//! so one blueprint can back any number of live trees and decorators can restart
//! a child as often as they like.
//!
//! # Suspension protocol
//!
//! Each time an instance is resumed it returns a [`Step`]:
//!
//! - [`Step::Pending`]: not done, resume me again next step
//! - [`Step::Descend`]: run this child task, then resume me with its result
//! - [`Step::Complete`]: finished with a terminal [`Status`]
//!
//! The value passed back in is a [`Resume`]. A child's status arrives exactly
//! once, on the resumption right after the child completed. Errors raised below
//! a node arrive as [`Resume::Raised`], which gives the node a chance to handle
//! them before they continue up the stack.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;

use crate::{Blackboard, Params, Status, TreeError};

/// Diagnostic identity of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskMeta {
    pub name: &'static str,
    pub doc: Option<&'static str>,
}

/// Outcome of resuming an execution sequence once.
pub enum Step<C> {
    /// Not finished. Resume the same sequence on the next step.
    Pending,
    /// Suspend this sequence and run a fresh instance of the child task.
    Descend(Task<C>),
    /// Finished with a terminal result.
    Complete(Status),
}

impl<C> Step<C> {
    /// Completes with `Success` or `Failure` depending on `success`.
    #[inline]
    pub fn done(success: bool) -> Self {
        Step::Complete(Status::from(success))
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Step::Pending)
    }
}

impl<C> fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Pending => f.write_str("Pending"),
            Step::Descend(task) => f.debug_tuple("Descend").field(&task.name()).finish(),
            Step::Complete(status) => f.debug_tuple("Complete").field(status).finish(),
        }
    }
}

/// Input delivered to a sequence when it is resumed.
#[derive(Debug)]
pub enum Resume {
    /// Nothing to deliver: first run, or continuing after `Pending`.
    Continue,
    /// The child this sequence descended into finished.
    Child(Status),
    /// The child this sequence descended into raised an error.
    Raised(TreeError),
}

impl Resume {
    /// Turns a delivered error back into `Err`, for sequences that do not handle errors.
    #[inline]
    pub fn received(self) -> Result<Option<Status>, TreeError> {
        match self {
            Resume::Continue => Ok(None),
            Resume::Child(status) => Ok(Some(status)),
            Resume::Raised(err) => Err(err),
        }
    }
}

/// Per-step view handed to a running sequence.
///
/// The target is the host's opaque handle. The engine never looks inside it.
pub struct StepCtx<'a, C> {
    target: &'a mut C,
    dt: Duration,
}

impl<'a, C> StepCtx<'a, C> {
    pub fn new(target: &'a mut C, dt: Duration) -> Self {
        Self { target, dt }
    }

    pub fn target(&self) -> &C {
        self.target
    }

    pub fn target_mut(&mut self) -> &mut C {
        self.target
    }

    /// Time elapsed since the previous step.
    pub fn dt(&self) -> Duration {
        self.dt
    }
}

/// The body of one execution sequence.
///
/// Implementations keep their own progress between calls. They must not block:
/// long-running work is split across several `Pending` steps.
pub trait Routine<C> {
    fn resume(&mut self, cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError>;
}

/// A [`Routine`] backed by a closure. See [`routine`].
pub struct FnRoutine<F>(F);

impl<C, F> Routine<C> for FnRoutine<F>
where
    F: FnMut(&mut StepCtx<'_, C>, Resume) -> Result<Step<C>, TreeError>,
{
    #[inline]
    fn resume(&mut self, cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        (self.0)(cx, input)
    }
}

/// Wraps a closure as a routine. State lives in the closure's captures.
pub fn routine<C, F>(f: F) -> FnRoutine<F>
where
    F: FnMut(&mut StepCtx<'_, C>, Resume) -> Result<Step<C>, TreeError>,
{
    FnRoutine(f)
}

type Body<C> = dyn Fn(&Params) -> Box<dyn Routine<C>>;

/// A reusable task blueprint (task factory).
///
/// Construction-time parameters are frozen into the blueprint. Run-time
/// parameters arrive with [`Task::instantiate`] and are overridden by
/// construction-time values of the same name.
pub struct Task<C> {
    meta: TaskMeta,
    init: Rc<Params>,
    body: Rc<Body<C>>,
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta,
            init: Rc::clone(&self.init),
            body: Rc::clone(&self.body),
        }
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.meta.name)
            .field("params", &self.init)
            .finish_non_exhaustive()
    }
}

impl<C: 'static> Task<C> {
    /// Creates a blueprint whose body builds a routine from the merged parameters.
    pub fn new<R, F>(name: &'static str, body: F) -> Self
    where
        F: Fn(&Params) -> R + 'static,
        R: Routine<C> + 'static,
    {
        Self {
            meta: TaskMeta { name, doc: None },
            init: Rc::new(Params::new()),
            body: Rc::new(move |params| Box::new(body(params)) as Box<dyn Routine<C>>),
        }
    }
}

impl<C> Task<C> {
    pub fn name(&self) -> &'static str {
        self.meta.name
    }

    pub fn doc(&self) -> Option<&'static str> {
        self.meta.doc
    }

    pub fn meta(&self) -> TaskMeta {
        self.meta
    }

    /// Construction-time parameters frozen into this blueprint.
    pub fn params(&self) -> &Params {
        &self.init
    }

    /// Returns a copy of this blueprint carrying documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: &'static str) -> Self {
        self.meta.doc = Some(doc);
        self
    }

    /// Returns a copy of this blueprint with an extra construction-time parameter.
    ///
    /// Other handles to the original blueprint are not affected.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut params = (*self.init).clone();
        params.insert(key, value);
        self.init = Rc::new(params);
        self
    }

    /// Returns a copy of this blueprint bound to `blackboard` at construction time.
    #[must_use]
    pub fn with_blackboard(mut self, blackboard: Blackboard) -> Self {
        let mut params = (*self.init).clone();
        params.set_blackboard(blackboard);
        self.init = Rc::new(params);
        self
    }

    /// Produces a fresh execution sequence.
    pub fn instantiate(&self, run: &Params) -> Instance<C> {
        let params = run.overridden_by(&self.init);
        Instance {
            meta: self.meta,
            routine: (self.body)(&params),
            finished: false,
        }
    }

    /// Returns `true` if both handles share one body.
    pub fn same_body(&self, other: &Task<C>) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

/// One run of one task: a resumable execution sequence.
pub struct Instance<C> {
    meta: TaskMeta,
    routine: Box<dyn Routine<C>>,
    finished: bool,
}

impl<C> Instance<C> {
    pub fn name(&self) -> &'static str {
        self.meta.name
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances the sequence once.
    ///
    /// Completing or raising terminates the sequence; resuming it afterwards
    /// fails with [`TreeError::Exhausted`].
    pub fn resume(
        &mut self,
        cx: &mut StepCtx<'_, C>,
        input: Resume,
    ) -> Result<Step<C>, TreeError> {
        if self.finished {
            return Err(TreeError::Exhausted {
                task: self.meta.name,
            });
        }
        let outcome = self.routine.resume(cx, input);
        if matches!(outcome, Ok(Step::Complete(_)) | Err(_)) {
            self.finished = true;
        }
        outcome
    }
}

impl<C> fmt::Debug for Instance<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.meta.name)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
