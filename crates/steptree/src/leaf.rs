//! Leaf tasks.
//!
//! Leaves never descend. They either finish right away, finish after a number
//! of pending steps, raise an error, or run user code against the target.

use std::rc::Rc;

use crate::{ErrorCategory, Params, Resume, Status, Step, StepCtx, Task, TreeError, routine};

/// Always succeeds.
pub fn succeed<C: 'static>() -> Task<C> {
    after("succeed", 0, Status::Success)
}

/// Always fails.
pub fn fail<C: 'static>() -> Task<C> {
    after("fail", 0, Status::Failure)
}

/// Reports pending `steps` times, then succeeds.
pub fn succeed_after<C: 'static>(steps: u32) -> Task<C> {
    after("succeed_after", steps, Status::Success)
}

/// Reports pending `steps` times, then fails.
pub fn fail_after<C: 'static>(steps: u32) -> Task<C> {
    after("fail_after", steps, Status::Failure)
}

fn after<C: 'static>(name: &'static str, steps: u32, status: Status) -> Task<C> {
    Task::new(name, move |_params: &Params| {
        let mut left = steps;
        routine(move |_cx: &mut StepCtx<'_, C>, input: Resume| {
            input.received()?;
            if left == 0 {
                return Ok(Step::Complete(status));
            }
            left -= 1;
            Ok(Step::Pending)
        })
    })
}

/// Raises a domain error in `category` every time it is advanced.
pub fn throw<C: 'static>(category: impl Into<ErrorCategory>, message: impl Into<String>) -> Task<C> {
    let category = category.into();
    let message: Rc<str> = Rc::from(message.into());
    Task::new("throw", move |_params: &Params| {
        let category = category.clone();
        let message = Rc::clone(&message);
        routine(move |_cx: &mut StepCtx<'_, C>, _input: Resume| {
            Err(TreeError::raise(category.clone(), message.to_string()))
        })
    })
}

/// Runs `f` on every resumption until it returns something other than `Pending`.
///
/// The closure sees the step context and the task's merged parameters. Errors
/// delivered from below cannot reach a leaf, so `f` only sees forward progress.
pub fn leaf<C, F>(name: &'static str, f: F) -> Task<C>
where
    C: 'static,
    F: Fn(&mut StepCtx<'_, C>, &Params) -> Result<Step<C>, TreeError> + 'static,
{
    let f = Rc::new(f);
    Task::new(name, move |params: &Params| {
        let f = Rc::clone(&f);
        let params = params.clone();
        routine(move |cx: &mut StepCtx<'_, C>, input: Resume| {
            input.received()?;
            (*f)(cx, &params)
        })
    })
}

/// Succeeds if `predicate` holds for the target, fails otherwise.
pub fn condition<C, F>(name: &'static str, predicate: F) -> Task<C>
where
    C: 'static,
    F: Fn(&C) -> bool + 'static,
{
    leaf(name, move |cx, _params| Ok(Step::done(predicate(cx.target()))))
}

/// Runs `act` against the target once and completes with its status.
pub fn action<C, F>(name: &'static str, act: F) -> Task<C>
where
    C: 'static,
    F: Fn(&mut C) -> Status + 'static,
{
    leaf(name, move |cx, _params| Ok(Step::Complete(act(cx.target_mut()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Progress, Visitor};
    use std::time::Duration;

    const DT: Duration = Duration::ZERO;

    #[test]
    fn succeed_and_fail_are_restartable() {
        let yes = succeed::<()>();
        let no = fail::<()>();
        for _ in 0..2 {
            assert_eq!(
                Visitor::new(&yes, Params::new()).step(&mut (), DT),
                Ok(Progress::Finished(Status::Success))
            );
            assert_eq!(
                Visitor::new(&no, Params::new()).step(&mut (), DT),
                Ok(Progress::Finished(Status::Failure))
            );
        }
    }

    #[test]
    fn after_leaves_pend_the_requested_number_of_steps() {
        let mut visitor = Visitor::new(&fail_after::<()>(2), Params::new());
        assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Pending));
        assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Pending));
        assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Finished(Status::Failure)));
    }

    #[test]
    fn throw_raises_its_category_and_message() {
        let mut visitor = Visitor::new(&throw::<()>("blocked", "wall ahead"), Params::new());
        let err = visitor.step(&mut (), DT).unwrap_err();
        assert_eq!(err.category(), Some(&ErrorCategory::from("blocked")));
        assert_eq!(err.raised().unwrap().message, "wall ahead");
    }

    #[test]
    fn conditions_and_actions_use_the_target() {
        let is_positive = condition("is_positive", |value: &i32| *value > 0);
        let increment = action("increment", |value: &mut i32| {
            *value += 1;
            Status::Success
        });

        let mut value = 0;
        assert_eq!(
            Visitor::new(&is_positive, Params::new()).step(&mut value, DT),
            Ok(Progress::Finished(Status::Failure))
        );
        assert_eq!(
            Visitor::new(&increment, Params::new()).step(&mut value, DT),
            Ok(Progress::Finished(Status::Success))
        );
        assert_eq!(value, 1);
        assert_eq!(
            Visitor::new(&is_positive, Params::new()).step(&mut value, DT),
            Ok(Progress::Finished(Status::Success))
        );
    }

    #[test]
    fn leaves_read_merged_params() {
        let speed = leaf("speed", |cx: &mut StepCtx<'_, u32>, params: &Params| {
            *cx.target_mut() = params.require("speed", "speed")?;
            Ok(Step::Complete(Status::Success))
        })
        .with_param("speed", 4);

        let mut target = 0;
        Visitor::new(&speed, Params::new().with("speed", 1))
            .step(&mut target, DT)
            .unwrap();
        assert_eq!(target, 4);
    }
}
