use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::debug;

use crate::types::{
    AclChange, AclEntry, Action, ApplyOperation, CurrentState, DesiredState, EntryKey,
    ReconciliationTask, Recursion, Verdict,
};

/// Decides whether a path is in sync and, if not, what to change.
///
/// The reconciler holds no state between calls; `evaluate` is a pure function
/// of its inputs and may be called concurrently for different paths.
///
/// ## Superset relaxation
///
/// Under [`Action::Set`] the strict rule is that the live ACL equals the
/// declared entries. The live listing routinely carries entries the
/// declaration never mentions (owning entries, a recalculated mask, entries
/// managed elsewhere), so by default a live ACL that already contains every
/// declared entry is also accepted. This is an approximation: it does not
/// notice a declared entry that is shadowed by a narrower mask. Use
/// [`Reconciler::strict`] to require equality instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciler {
    superset_relaxation: bool,
}

impl Default for Reconciler {
    fn default() -> Self {
        Reconciler {
            superset_relaxation: true,
        }
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Reconciler::default()
    }

    /// A reconciler that only accepts exact equality under `Set`.
    pub fn strict() -> Self {
        Reconciler {
            superset_relaxation: false,
        }
    }

    pub fn with_superset_relaxation(mut self, enabled: bool) -> Self {
        self.superset_relaxation = enabled;
        self
    }

    pub fn superset_relaxation(&self) -> bool {
        self.superset_relaxation
    }

    pub fn evaluate_task(&self, task: &ReconciliationTask) -> Verdict {
        self.evaluate(&task.desired, &task.current)
    }

    pub fn evaluate(&self, desired: &DesiredState, current: &CurrentState) -> Verdict {
        debug!(
            event = "Reconcile",
            phase = "Evaluate",
            path = %desired.path().display(),
            action = desired.action().as_ref(),
            desired = desired.entries().len(),
            current = current.entries().len(),
            opaque = current.opaque().len()
        );

        // One mode per declaration.
        let change = match desired.action() {
            Action::Purge => purge_change(current),
            Action::Unset => unset_change(desired, current),
            Action::Exact => exact_change(desired, current),
            Action::Set => self.set_change(desired, current),
        };

        let Some(change) = change else {
            debug!(event = "Reconcile", phase = "Result", path = %desired.path().display(), result = "in sync");
            return Verdict::InSync;
        };

        let recursion = if desired.is_lazy_recursive() {
            Recursion::Native
        } else {
            Recursion::PathOnly
        };
        let op = ApplyOperation::new(desired.path(), change, recursion);
        debug!(event = "Reconcile", phase = "Result", path = %desired.path().display(), operation = %op);
        Verdict::Apply(op)
    }

    fn set_change(&self, desired: &DesiredState, current: &CurrentState) -> Option<AclChange> {
        let wanted = desired.unique_entries();
        let have = current.entry_set();

        if wanted.iter().collect::<BTreeSet<_>>() == have {
            return None;
        }

        let missing: Vec<AclEntry> = wanted
            .iter()
            .filter(|entry| !have.contains(entry))
            .cloned()
            .collect();

        if missing.is_empty() {
            if self.superset_relaxation {
                return None;
            }
            return Some(AclChange::Modify(wanted));
        }
        Some(AclChange::Modify(missing))
    }
}

fn unset_change(desired: &DesiredState, current: &CurrentState) -> Option<AclChange> {
    let have = current.key_set();
    let remove: Vec<EntryKey> = desired
        .entries()
        .iter()
        .filter(|entry| !entry.is_unqualified_access())
        .map(AclEntry::key)
        .unique()
        .filter(|key| have.contains(key))
        .collect();

    (!remove.is_empty()).then_some(AclChange::Remove(remove))
}

fn purge_change(current: &CurrentState) -> Option<AclChange> {
    (!current.is_minimal()).then_some(AclChange::Purge)
}

fn exact_change(desired: &DesiredState, current: &CurrentState) -> Option<AclChange> {
    let wanted = desired.unique_entries();
    if wanted.iter().collect::<BTreeSet<_>>() == current.entry_set() {
        return None;
    }
    Some(AclChange::Replace(wanted))
}

#[cfg(test)]
mod tests;
