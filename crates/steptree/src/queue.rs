//! Work queues fed from outside the tree.
//!
//! The host pushes task blueprints onto a shared [`TaskQueue`]; a [`queue`] or
//! [`parallel_queue`] node inside a running tree drains it. Neither node ever
//! finishes.
//!
//! Items are taken from the end of the queue, so the most recently pushed
//! task runs first.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::{Params, Progress, Resume, Routine, Step, StepCtx, Task, TreeError, Visitor};

/// Shared handle to a list of pending task blueprints.
pub struct TaskQueue<C> {
    items: Rc<RefCell<Vec<Task<C>>>>,
}

impl<C> TaskQueue<C> {
    pub fn new() -> Self {
        Self {
            items: Rc::default(),
        }
    }

    pub fn push(&self, task: Task<C>) {
        self.items.borrow_mut().push(task);
    }

    /// Takes the most recently pushed task.
    pub fn pop(&self) -> Option<Task<C>> {
        self.items.borrow_mut().pop()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }
}

impl<C> Clone for TaskQueue<C> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
        }
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TaskQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.items.borrow().iter().map(Task::name).collect();
        f.debug_struct("TaskQueue").field("items", &names).finish()
    }
}

/// Runs queued tasks one at a time. Reports pending while the queue is empty.
pub fn queue<C: 'static>(source: TaskQueue<C>) -> Task<C> {
    Task::new("queue", move |_params: &Params| Serial {
        source: source.clone(),
        running: false,
    })
}

struct Serial<C> {
    source: TaskQueue<C>,
    running: bool,
}

impl<C> Routine<C> for Serial<C> {
    fn resume(&mut self, _cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        if let Some(status) = input.received()? {
            tracing::trace!(?status, remaining = self.source.len(), "queued task finished");
            self.running = false;
        }
        if self.running {
            return Ok(Step::Pending);
        }
        match self.source.pop() {
            Some(task) => {
                self.running = true;
                Ok(Step::Descend(task))
            }
            None => Ok(Step::Pending),
        }
    }
}

/// Runs every queued task side by side, picking up new arrivals each step.
///
/// Each own step first moves all queued tasks into the running set, then
/// advances every running task once. Finished tasks leave the set.
pub fn parallel_queue<C: 'static>(source: TaskQueue<C>) -> Task<C> {
    Task::new("parallel_queue", move |params: &Params| Interleaved {
        source: source.clone(),
        params: params.clone(),
        running: VecDeque::new(),
    })
}

struct Interleaved<C> {
    source: TaskQueue<C>,
    params: Params,
    running: VecDeque<Visitor<C>>,
}

impl<C> Routine<C> for Interleaved<C> {
    fn resume(&mut self, cx: &mut StepCtx<'_, C>, input: Resume) -> Result<Step<C>, TreeError> {
        input.received()?;
        while let Some(task) = self.source.pop() {
            self.running.push_back(Visitor::new(&task, self.params.clone()));
        }

        let dt = cx.dt();
        for _ in 0..self.running.len() {
            let Some(mut branch) = self.running.pop_front() else {
                break;
            };
            if let Progress::Finished(status) = branch.step(cx.target_mut(), dt)? {
                tracing::trace!(?status, "queued task finished");
                continue;
            }
            self.running.push_back(branch);
        }
        Ok(Step::Pending)
    }
}
