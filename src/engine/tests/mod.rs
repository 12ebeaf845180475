use super::*;
use crate::types::{AclChange, IgnoreMissing, RecurseMode};
use yare::parameterized;

mod set;

const BASE: &[&str] = &["user::rwx", "group::rwx", "mask::rwx", "other::---"];

fn entries(raw: &[&str]) -> Vec<AclEntry> {
    raw.iter().map(|s| s.parse().unwrap()).collect()
}

fn desired(action: Action, raw: &[&str]) -> DesiredState {
    DesiredState::new("/opt/test", entries(raw))
        .unwrap()
        .with_action(action)
}

fn current(raw: &[&str]) -> CurrentState {
    CurrentState::from_lines(raw.iter().copied())
}

fn current_with_base(extra: &[&str]) -> CurrentState {
    CurrentState::from_lines(BASE.iter().chain(extra.iter()))
}

fn rendered(entries: &[AclEntry]) -> Vec<String> {
    entries.iter().map(ToString::to_string).collect()
}

#[parameterized(
    set = { Action::Set },
    unset = { Action::Unset },
    exact = { Action::Exact },
    purge = { Action::Purge },
)]
fn test_lazy_recursion_is_native(action: Action) {
    let state = desired(action, &["user:blub:r-x"]).with_recursion(true, RecurseMode::Lazy);
    let live = current(&["user::rwx", "user:blub:rwx", "group::r-x", "mask::rwx", "other::---"]);

    let verdict = Reconciler::new().evaluate(&state, &live);
    let op = verdict.operation().expect("out of sync");
    assert_eq!(op.recursion(), Recursion::Native);
    assert_eq!(op.path(), state.path());
}

#[test]
fn test_deep_recursion_targets_path_only() {
    let state = desired(Action::Set, &["user:blub:r-x"])
        .with_recursion(true, RecurseMode::Deep)
        .with_ignore_missing(IgnoreMissing::Quiet);
    let verdict = Reconciler::new().evaluate(&state, &current(BASE));
    assert_eq!(verdict.operation().unwrap().recursion(), Recursion::PathOnly);
}

#[test]
fn test_evaluate_task_matches_evaluate() {
    let state = desired(Action::Exact, BASE);
    let live = current(&["user::rwx", "group::rwx", "other::---"]);
    let task = ReconciliationTask::new(state.clone(), live.clone());

    let reconciler = Reconciler::new();
    assert_eq!(reconciler.evaluate_task(&task), reconciler.evaluate(&state, &live));
}

#[test]
fn test_reconciler_is_shareable_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let reconciler = Arc::new(Reconciler::new());
    let mut handles = vec![];

    for i in 0..8 {
        let reconciler = Arc::clone(&reconciler);
        handles.push(thread::spawn(move || {
            let state = DesiredState::new(
                format!("/srv/share{i}"),
                entries(&["user:blub:r-x"]),
            )
            .unwrap();
            for _ in 0..100 {
                let verdict = reconciler.evaluate(&state, &current(BASE));
                assert!(matches!(
                    verdict.operation().map(ApplyOperation::change),
                    Some(AclChange::Modify(_))
                ));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
