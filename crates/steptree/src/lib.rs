//! Resumable, step-driven behavior trees.
//!
//! Trees are built from reusable [`Task`] blueprints and run incrementally by a
//! [`Visitor`], one step per world update. Each step resumes exactly one node;
//! nodes that need more time report pending and are resumed on the next step.
//!
//! - **Blueprints, not instances**: a [`Task`] can be instantiated any number of
//!   times, so one tree definition serves many live trees
//! - **Explicit stack**: the visitor keeps suspended parents on its own stack
//!   instead of relying on coroutines
//! - **Tree-shaped error handling**: raised errors unwind one frame at a time
//!   and can be intercepted by [`catch`]
//! - **Opaque targets**: the host's target type `C` is only handed to leaves
//!
//! # Architecture
//!
//! - [`Task`] / [`Instance`] / [`Routine`]: blueprints, execution sequences and their bodies
//! - [`Visitor`]: the depth-first scheduler
//! - Composite nodes: [`sequence`], [`selector`], [`parallel`]
//! - Decorator nodes: [`identity`], [`flip`], [`repeat_until_fail`],
//!   [`repeat_until_succeed`], [`repeat_always`], [`limit`], [`catch`], [`log`]
//! - Queue nodes: [`queue`], [`parallel_queue`]
//! - [`Blackboard`] / [`BlackboardRegistry`]: shared storage between nodes
//! - [`Agent`]: per-entity driver for host applications
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use steptree::{Params, Progress, Status, Visitor, action, condition, selector, sequence};
//!
//! let tree = selector(vec![
//!     sequence(vec![
//!         condition("is_tired", |energy: &i32| *energy < 3),
//!         action("rest", |energy: &mut i32| {
//!             *energy += 5;
//!             Status::Success
//!         }),
//!     ]),
//!     action("work", |energy: &mut i32| {
//!         *energy -= 1;
//!         Status::Success
//!     }),
//! ]);
//!
//! let mut energy = 1;
//! let mut visitor = Visitor::new(&tree, Params::new());
//! let result = loop {
//!     if let Progress::Finished(status) = visitor.step(&mut energy, Duration::ZERO).unwrap() {
//!         break status;
//!     }
//! };
//! assert_eq!(result, Status::Success);
//! assert_eq!(energy, 6);
//! ```

pub mod agent;
pub mod blackboard;
pub mod composite;
pub mod decorator;
pub mod error;
pub mod leaf;
pub mod params;
pub mod queue;
pub mod status;
pub mod task;
pub mod visitor;

// Re-export core types for ergonomic API
pub use agent::{Agent, AgentConfig, AgentEvent};
pub use blackboard::{Blackboard, BlackboardRegistry, check_bb, check_bb_with, set_bb};
pub use composite::{POLICY_KEY, Policy, parallel, selector, sequence};
pub use decorator::{
    Catch, catch, flip, identity, limit, log, repeat_always, repeat_until_fail, repeat_until_succeed,
};
pub use error::{ErrorCategory, ErrorClass, Raised, TreeError};
pub use leaf::{action, condition, fail, fail_after, leaf, succeed, succeed_after, throw};
pub use params::Params;
pub use queue::{TaskQueue, parallel_queue, queue};
pub use status::Status;
pub use task::{FnRoutine, Instance, Resume, Routine, Step, StepCtx, Task, TaskMeta, routine};
pub use visitor::{Progress, Visitor};
