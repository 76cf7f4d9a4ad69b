//! Terminal results returned by finished tasks.

/// The terminal result of a task.
///
/// Only terminal results travel up the tree. A task that is not finished yet
/// reports [`Step::Pending`](crate::Step::Pending) instead, which never leaves
/// the node that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Status {
    /// The task completed successfully.
    ///
    /// For conditions: the condition was met.
    /// For actions: the action ran to completion.
    Success,

    /// The task failed.
    ///
    /// Failure is an ordinary outcome, not an error. Errors are raised
    /// separately and unwind the stack until a `catch` node handles them.
    Failure,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Inverts the status: Success becomes Failure and vice versa.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
        }
    }
}

impl From<bool> for Status {
    #[inline]
    fn from(value: bool) -> Self {
        if value { Status::Success } else { Status::Failure }
    }
}

impl From<Status> for bool {
    #[inline]
    fn from(status: Status) -> Self {
        status.is_success()
    }
}
