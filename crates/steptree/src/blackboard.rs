//! Shared key-value storage for inter-node communication.
//!
//! A [`Blackboard`] is a handle: clones share one backing map, so every task
//! that receives the handle through its parameters sees the same values.
//! Named boards come from a host-owned [`BlackboardRegistry`], which hands out
//! the same store for the same name and isolated stores for different names.
//!
//! There is no locking. Access is single-threaded and cooperative; keeping
//! values consistent between visitors that share a board is up to the host.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::{Params, Resume, Status, Step, StepCtx, Task, routine};

/// Handle to a shared key-value store. Absent keys read as `None`.
#[derive(Clone, Default)]
pub struct Blackboard {
    name: Option<Rc<str>>,
    entries: Rc<RefCell<HashMap<String, Value>>>,
}

impl Blackboard {
    /// Creates an anonymous board with its own storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn named(name: &str) -> Self {
        Self {
            name: Some(Rc::from(name)),
            entries: Rc::default(),
        }
    }

    /// Registry name, if this board came from a [`BlackboardRegistry`].
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    /// Reads a value and hands it to `f` without cloning it.
    ///
    /// The store stays borrowed while `f` runs, so `f` must not write to this board.
    pub fn with_value<R>(&self, key: &str, f: impl FnOnce(Option<&Value>) -> R) -> R {
        f(self.entries.borrow().get(key))
    }

    /// Stores a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.borrow_mut().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.borrow_mut().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Returns `true` if both handles point at the same storage.
    pub fn shares_storage(&self, other: &Blackboard) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blackboard")
            .field("name", &self.name)
            .field("entries", &*self.entries.borrow())
            .finish()
    }
}

/// Host-owned registry mapping names to shared blackboards.
///
/// Boards are created on first use and live until the host removes them or
/// drops the registry. Handles already given out keep working after removal,
/// but a later lookup of the same name starts a fresh store.
#[derive(Debug, Default)]
pub struct BlackboardRegistry {
    boards: HashMap<String, Blackboard>,
}

impl BlackboardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the board registered under `name`, creating it on first use.
    pub fn board(&mut self, name: &str) -> Blackboard {
        self.boards
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(name, "creating blackboard");
                Blackboard::named(name)
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Blackboard> {
        self.boards.get(name).cloned()
    }

    pub fn remove(&mut self, name: &str) -> Option<Blackboard> {
        self.boards.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.boards.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.boards.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn clear(&mut self) {
        self.boards.clear();
    }
}

/// Succeeds if `key` holds a value on the bound blackboard.
///
/// JSON `null` counts as no value.
pub fn check_bb<C: 'static>(key: impl Into<String>) -> Task<C> {
    check_bb_with(key, |value| value.is_some_and(|v| !v.is_null()))
}

/// Succeeds if `check` accepts the value stored under `key`.
pub fn check_bb_with<C, F>(key: impl Into<String>, check: F) -> Task<C>
where
    C: 'static,
    F: Fn(Option<&Value>) -> bool + 'static,
{
    let key: Rc<str> = Rc::from(key.into());
    let check = Rc::new(check);
    Task::new("check_bb", move |params: &Params| {
        let board = params.require_blackboard("check_bb").cloned();
        let key = Rc::clone(&key);
        let check = Rc::clone(&check);
        routine(move |_cx: &mut StepCtx<'_, C>, input: Resume| {
            input.received()?;
            let value = board.clone()?.get(&key);
            Ok(Step::Complete(Status::from((*check)(value.as_ref()))))
        })
    })
}

/// Writes `value` under `key` on the bound blackboard, then succeeds.
pub fn set_bb<C: 'static>(key: impl Into<String>, value: impl Into<Value>) -> Task<C> {
    let key: Rc<str> = Rc::from(key.into());
    let value = Rc::new(value.into());
    Task::new("set_bb", move |params: &Params| {
        let board = params.require_blackboard("set_bb").cloned();
        let key = Rc::clone(&key);
        let value = Rc::clone(&value);
        routine(move |_cx: &mut StepCtx<'_, C>, input: Resume| {
            input.received()?;
            board.clone()?.set(&*key, (*value).clone());
            Ok(Step::Complete(Status::Success))
        })
    })
}
