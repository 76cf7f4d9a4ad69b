//! The run-time parameter channel.
//!
//! A [`Params`] bag is handed to the root of a tree when a [`Visitor`](crate::Visitor)
//! is created and threaded unchanged to every task the visitor instantiates.
//! Each task merges it with its own construction-time parameters, and the
//! construction-time values win.
//!
//! Besides an optional [`Blackboard`], the bag holds arbitrary named JSON values.
//! Keys a task does not recognize are passed along untouched.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Blackboard, TreeError};

/// Open-ended named parameters plus an optional shared blackboard.
#[derive(Clone, Debug, Default)]
pub struct Params {
    blackboard: Option<Blackboard>,
    extras: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a blackboard (builder pattern).
    #[must_use]
    pub fn with_blackboard(mut self, blackboard: Blackboard) -> Self {
        self.blackboard = Some(blackboard);
        self
    }

    /// Adds a named value (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.extras.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.extras.remove(key)
    }

    pub fn set_blackboard(&mut self, blackboard: Blackboard) {
        self.blackboard = Some(blackboard);
    }

    pub fn blackboard(&self) -> Option<&Blackboard> {
        self.blackboard.as_ref()
    }

    /// Returns the bound blackboard, or a config error naming the task that needed it.
    pub fn require_blackboard(&self, task: &'static str) -> Result<&Blackboard, TreeError> {
        self.blackboard.as_ref().ok_or_else(|| TreeError::MissingParam {
            task,
            key: "blackboard".to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.extras.contains_key(key)
    }

    /// Decodes an optional value into `T`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        task: &'static str,
        key: &str,
    ) -> Result<Option<T>, TreeError> {
        self.extras
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| TreeError::InvalidParam {
                    task,
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Decodes a value into `T`, failing if the key is absent.
    pub fn require<T: DeserializeOwned>(&self, task: &'static str, key: &str) -> Result<T, TreeError> {
        self.get_as(task, key)?.ok_or_else(|| TreeError::MissingParam {
            task,
            key: key.to_string(),
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.extras.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.blackboard.is_none() && self.extras.is_empty()
    }

    /// Returns `self` with every entry of `overrides` written over it.
    pub fn overridden_by(&self, overrides: &Params) -> Params {
        let mut merged = self.clone();
        if let Some(blackboard) = &overrides.blackboard {
            merged.blackboard = Some(blackboard.clone());
        }
        merged
            .extras
            .extend(overrides.extras.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}
