use super::*;

#[test]
fn test_set_in_sync_when_equal() {
    let state = desired(Action::Set, BASE);
    assert!(Reconciler::new().evaluate(&state, &current(BASE)).in_sync());
}

#[test]
fn test_set_in_sync_when_equal_in_any_order() {
    let state = desired(Action::Set, &["other::---", "mask::rwx", "u::7", "group::rwx", "u::rwx"]);
    assert!(Reconciler::strict().evaluate(&state, &current(BASE)).in_sync());
}

#[test]
fn test_set_accepts_superset_by_default() {
    let state = desired(Action::Set, &["user:blub2:r-x"]);
    let live = current_with_base(&["user:blub:r-x", "user:blub2:r-x"]);
    assert!(Reconciler::new().evaluate(&state, &live).in_sync());
}

#[test]
fn test_set_strict_rejects_superset() {
    let state = desired(Action::Set, &["user:blub2:r-x"]);
    let live = current_with_base(&["user:blub2:r-x"]);

    let verdict = Reconciler::strict().evaluate(&state, &live);
    match verdict.operation().map(ApplyOperation::change) {
        Some(AclChange::Modify(entries)) => assert_eq!(rendered(entries), vec!["user:blub2:r-x"]),
        other => panic!("Expected Modify, got {other:?}"),
    }
}

#[parameterized(
    new_named_user = { &["user:blub2:r-x"], &["user:blub2:r-x"] },
    changed_bits = { &["user:blub:rwx"], &["user:blub:rwx"] },
    partially_present = { &["user:blub:r-x", "group:wheel:rw-", "other::---"], &["group:wheel:rw-"] },
    default_entries = { &["d:u::7", "d:o::0"], &["default:user::rwx", "default:other::---"] },
)]
fn test_set_modifies_only_missing(wanted: &[&str], expected: &[&str]) {
    let state = desired(Action::Set, wanted);
    let live = current_with_base(&["user:blub:r-x"]);

    let verdict = Reconciler::new().evaluate(&state, &live);
    match verdict.operation().map(ApplyOperation::change) {
        Some(AclChange::Modify(entries)) => assert_eq!(rendered(entries), expected),
        other => panic!("Expected Modify, got {other:?}"),
    }
}

#[test]
fn test_set_ignores_duplicate_declarations() {
    let state = desired(Action::Set, &["user:blub:r-x", "u:blub:5", "user:blub:r-x"]);
    let verdict = Reconciler::new().evaluate(&state, &current(BASE));
    match verdict.operation().map(ApplyOperation::change) {
        Some(AclChange::Modify(entries)) => assert_eq!(rendered(entries), vec!["user:blub:r-x"]),
        other => panic!("Expected Modify, got {other:?}"),
    }
}

#[test]
fn test_set_never_removes_unrelated_entries() {
    let state = desired(Action::Set, &["user:blub:rwx", "group:wheel:r--"]);
    let live = current_with_base(&["user:other:r-x", "default:user::rwx", "user:blub:---"]);

    let op = Reconciler::new()
        .evaluate(&state, &live)
        .into_operation()
        .expect("out of sync");
    let after = op.preview(&live);

    for entry in live.entries() {
        let named = state.entries().iter().any(|e| e.key() == entry.key());
        if !named {
            assert!(after.contains(entry), "{entry} was removed");
        }
    }
    assert!(Reconciler::new().evaluate(&state, &CurrentState::new(after)).in_sync());
}

#[test]
fn test_set_ignores_opaque_lines() {
    let state = desired(Action::Set, BASE);
    let live = current_with_base(&["user::rwX"]);
    assert!(Reconciler::new().evaluate(&state, &live).in_sync());
}
