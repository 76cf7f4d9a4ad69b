use std::time::Duration;

use steptree::{
    Blackboard, BlackboardRegistry, Catch, Params, Policy, Progress, Status, Task, TreeError,
    Visitor, action, catch, fail, fail_after, identity, parallel, selector, sequence, succeed,
    succeed_after, throw,
};

const DT: Duration = Duration::from_millis(16);

/// Records its tag on the target every time it runs.
fn probe(tag: &'static str, status: Status) -> Task<Vec<&'static str>> {
    action(tag, move |trace: &mut Vec<&'static str>| {
        trace.push(tag);
        status
    })
}

fn run(tree: &Task<Vec<&'static str>>) -> (Vec<Status>, Vec<&'static str>) {
    let mut trace = Vec::new();
    let statuses = Visitor::new(tree, Params::new())
        .run_to_end(&mut trace, DT)
        .unwrap();
    (statuses, trace)
}

/// Steps until the root finishes; returns the final status and the step it finished on.
fn finish_step<C>(tree: &Task<C>, target: &mut C) -> (Status, u64) {
    let mut visitor = Visitor::new(tree, Params::new());
    loop {
        if let Progress::Finished(status) = visitor.step(target, DT).unwrap() {
            return (status, visitor.steps());
        }
    }
}

#[test]
fn instances_of_one_blueprint_do_not_share_state() {
    let tree = sequence(vec![succeed_after(2), probe("a", Status::Success), fail_after(1)]);

    let mut first = Visitor::new(&tree, Params::new());
    let mut second = Visitor::new(&tree, Params::new());
    let mut trace_a = Vec::new();
    let mut trace_b = Vec::new();

    let mut seen_a = Vec::new();
    let mut seen_b = Vec::new();
    // Interleave the two runs step by step.
    while !first.is_finished() || !second.is_finished() {
        if !first.is_finished() {
            seen_a.push(first.step(&mut trace_a, DT).unwrap());
        }
        if !second.is_finished() {
            seen_b.push(second.step(&mut trace_b, DT).unwrap());
        }
    }
    assert_eq!(seen_a, seen_b);
    assert_eq!(trace_a, trace_b);
}

#[test]
fn sequence_short_circuits_on_failure() {
    let tree = sequence(vec![
        probe("first", Status::Success),
        probe("second", Status::Success),
        probe("third", Status::Failure),
        probe("fourth", Status::Success),
    ]);
    let (statuses, trace) = run(&tree);
    assert_eq!(
        statuses,
        vec![Status::Success, Status::Success, Status::Failure, Status::Failure]
    );
    assert_eq!(trace, vec!["first", "second", "third"]);
}

#[test]
fn selector_short_circuits_on_success() {
    let tree = selector(vec![
        probe("first", Status::Failure),
        probe("second", Status::Failure),
        probe("third", Status::Success),
        probe("fourth", Status::Failure),
    ]);
    let (statuses, trace) = run(&tree);
    assert_eq!(
        statuses,
        vec![Status::Failure, Status::Failure, Status::Success, Status::Success]
    );
    assert_eq!(trace, vec!["first", "second", "third"]);
}

#[test]
fn selector_fails_when_every_child_fails() {
    let tree = selector(vec![fail(), fail(), fail()]);
    let (statuses, _) = run(&tree);
    assert_eq!(statuses, vec![Status::Failure; 4]);
}

#[test]
fn parallel_require_all_fails_when_the_failing_child_resolves() {
    let tree = parallel(
        vec![succeed_after(1), succeed_after(2), fail_after(3)],
        Policy::RequireAll,
    );
    let mut visitor = Visitor::new(&tree, Params::new());
    for _ in 0..3 {
        assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Pending));
    }
    // fail_after(3) resolves on its fourth advance.
    assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Finished(Status::Failure)));
}

#[test]
fn parallel_require_all_with_nested_sequences() {
    let passing = parallel(
        vec![
            sequence(vec![succeed::<()>(), succeed()]),
            sequence(vec![succeed(), succeed()]),
        ],
        Policy::RequireAll,
    );
    assert_eq!(finish_step(&passing, &mut ()).0, Status::Success);

    let failing = parallel(
        vec![
            sequence(vec![succeed::<()>(), fail()]),
            sequence(vec![succeed(), succeed()]),
        ],
        Policy::RequireAll,
    );
    assert_eq!(finish_step(&failing, &mut ()).0, Status::Failure);
}

#[test]
fn parallel_require_one_fails_only_once_all_children_failed() {
    let tree = parallel(vec![fail::<()>(), fail_after(2)], Policy::RequireOne);
    assert_eq!(finish_step(&tree, &mut ()), (Status::Failure, 3));
}

#[test]
fn parallel_require_one_succeeds_on_first_success() {
    let tree = parallel(vec![succeed::<()>(), fail_after(5)], Policy::RequireOne);
    assert_eq!(finish_step(&tree, &mut ()), (Status::Success, 1));

    let nested = parallel(
        vec![
            sequence(vec![succeed::<()>(), succeed()]),
            sequence(vec![succeed(), fail()]),
        ],
        Policy::RequireOne,
    );
    assert_eq!(finish_step(&nested, &mut ()).0, Status::Success);
}

#[test]
fn identity_matches_child_timing_plus_descent() {
    for n in 0..4 {
        let mut visitor = Visitor::new(&identity(succeed_after::<()>(n)), Params::new());

        // The first step descends into the child.
        assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Pending));
        for _ in 0..n {
            assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Pending));
        }
        assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Ascend(Status::Success)));
        assert_eq!(visitor.step(&mut (), DT), Ok(Progress::Finished(Status::Success)));

        // Driving the child directly: the same n pending steps, then the same result.
        let mut direct = Visitor::new(&succeed_after::<()>(n), Params::new());
        for _ in 0..n {
            assert_eq!(direct.step(&mut (), DT), Ok(Progress::Pending));
        }
        assert_eq!(direct.step(&mut (), DT), Ok(Progress::Finished(Status::Success)));
    }
}

#[test]
fn catch_handles_matching_errors() {
    let tree = catch(
        throw::<()>("trap", "sprung"),
        Catch::new().caught("trap").branch(succeed()),
    );
    assert_eq!(finish_step(&tree, &mut ()).0, Status::Success);
}

#[test]
fn catch_propagates_other_categories_unchanged() {
    let tree = catch(
        throw::<()>("trap", "sprung"),
        Catch::new().caught("other").branch(succeed()),
    );
    let err = Visitor::new(&tree, Params::new())
        .run_to_end(&mut (), DT)
        .unwrap_err();
    assert_eq!(err, TreeError::raise("trap", "sprung"));
}

#[test]
fn blackboards_are_scoped_by_name() {
    let mut registry = BlackboardRegistry::new();
    let alpha = registry.board("alpha");
    let alpha_again = registry.board("alpha");
    let beta = registry.board("beta");

    alpha.set("seen", "intruder");
    assert_eq!(alpha_again.get("seen"), Some(serde_json::json!("intruder")));
    assert_eq!(beta.get("seen"), None);

    let anonymous = Blackboard::new();
    assert!(!anonymous.shares_storage(&alpha));
}

#[test]
fn fresh_visitor_reproduces_a_completed_run() {
    let tree = sequence(vec![
        probe("look", Status::Success),
        selector(vec![probe("attack", Status::Failure), probe("flee", Status::Success)]),
    ]);
    let first = run(&tree);
    let second = run(&tree);
    assert_eq!(first, second);
    assert_eq!(first.1, vec!["look", "attack", "flee"]);
}

#[test]
fn finished_visitors_stay_finished() {
    let mut visitor = Visitor::new(&succeed::<()>(), Params::new());
    visitor.run_to_end(&mut (), DT).unwrap();
    assert_eq!(visitor.step(&mut (), DT), Err(TreeError::VisitorExhausted));
}
