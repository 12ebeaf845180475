//! One reconciliation pass over a set of declarations.
//!
//! A pass indexes the declarations, expands deep-recursive ones into leaf
//! tasks, and then works through all tasks in path order so that every
//! ancestor is handled before its descendants. For each task the live ACL is
//! read, compared, and, if needed, changed. A task whose ancestor ACL failed
//! is not attempted.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::Reconciler;
use crate::error::AclError;
use crate::expand::expand;
use crate::metrics::{self, PassStats, TaskPhases, TaskStats};
use crate::ordering::{DeclarationIndex, FileIntent, Prerequisite, prerequisites};
use crate::timers::{PhaseTimer, as_millis_f64};
use crate::traits::{AclReader, AclWriter};
use crate::types::{
    ApplyOperation, CurrentState, DesiredState, IgnoreMissing, ReconciliationTask, Verdict,
};

/// What happened to one path during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Nothing to do
    InSync,
    /// The operation was applied
    Applied { operation: ApplyOperation },
    /// Dry run: the operation would have been applied
    Planned { operation: ApplyOperation },
    /// The target is missing and the declaration ignores that
    Skipped { notified: bool },
    /// Reading, applying or planning failed
    Failed { error: AclError },
    /// Not attempted because a prerequisite did not succeed
    Blocked { prerequisite: PathBuf },
}

impl TaskOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskOutcome::InSync => "in_sync",
            TaskOutcome::Applied { .. } => "applied",
            TaskOutcome::Planned { .. } => "planned",
            TaskOutcome::Skipped { .. } => "skipped",
            TaskOutcome::Failed { .. } => "failed",
            TaskOutcome::Blocked { .. } => "blocked",
        }
    }

    /// Failed or blocked. Descendants of such a task are blocked in turn.
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed { .. } | TaskOutcome::Blocked { .. })
    }

    pub fn operation(&self) -> Option<&ApplyOperation> {
        match self {
            TaskOutcome::Applied { operation } | TaskOutcome::Planned { operation } => {
                Some(operation)
            }
            _ => None,
        }
    }

    pub fn error(&self) -> Option<AclError> {
        match self {
            TaskOutcome::Failed { error } => Some(error.clone()),
            TaskOutcome::Blocked { prerequisite } => Some(AclError::OrderingViolation(format!(
                "prerequisite {} did not succeed",
                prerequisite.display()
            ))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub path: PathBuf,
    /// Produced by deep expansion rather than declared
    pub synthesized: bool,
    pub outcome: TaskOutcome,
    pub duration: Duration,
}

/// Outcome of every task in a pass, in the order the tasks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub tasks: Vec<TaskReport>,
    pub duration: Duration,
}

impl PassReport {
    pub fn get(&self, path: &Path) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.path == path)
    }

    fn count(&self, kind: &str) -> usize {
        self.tasks.iter().filter(|t| t.outcome.kind() == kind).count()
    }

    pub fn in_sync(&self) -> usize {
        self.count("in_sync")
    }

    /// Applied, or planned in a dry run.
    pub fn changed(&self) -> usize {
        self.count("applied") + self.count("planned")
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    pub fn blocked(&self) -> usize {
        self.count("blocked")
    }

    pub fn is_success(&self) -> bool {
        !self.tasks.iter().any(|t| t.outcome.is_failure())
    }

    pub fn stats(&self) -> PassStats {
        PassStats {
            tasks: self.tasks.len(),
            in_sync: self.in_sync(),
            changed: self.changed(),
            skipped: self.skipped(),
            failed: self.failed(),
            blocked: self.blocked(),
            duration: self.duration,
        }
    }
}

struct PlannedTask {
    desired: DesiredState,
    synthesized: bool,
    error: Option<AclError>,
}

#[derive(Default)]
struct PhaseDurations {
    read: Duration,
    evaluate: Duration,
    apply: Duration,
}

impl PhaseDurations {
    fn to_metrics(&self, total: Duration) -> TaskPhases {
        TaskPhases {
            read_ms: as_millis_f64(self.read),
            evaluate_ms: as_millis_f64(self.evaluate),
            apply_ms: as_millis_f64(self.apply),
            total_ms: as_millis_f64(total),
        }
    }
}

/// Runs reconciliation passes.
///
/// Tasks within a pass run one after another, so the read and the apply for a
/// path are never interleaved with another task on the same path.
#[derive(Debug, Clone, Default)]
pub struct PassRunner {
    reconciler: Reconciler,
    file_intents: Vec<FileIntent>,
    dry_run: bool,
}

impl PassRunner {
    pub fn new() -> Self {
        PassRunner::default()
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// File-creation intents declared outside this crate. They feed deep
    /// expansion and prerequisite computation.
    pub fn with_file_intents(mut self, intents: impl IntoIterator<Item = FileIntent>) -> Self {
        self.file_intents.extend(intents);
        self
    }

    /// Evaluate everything but never call the writer.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run<R, W>(&self, declarations: &[DesiredState], reader: &R, writer: &W) -> PassReport
    where
        R: AclReader + ?Sized,
        W: AclWriter + ?Sized,
    {
        let started = Instant::now();
        info!(
            event = "Reconcile",
            phase = "Pass",
            declarations = declarations.len(),
            dry_run = self.dry_run
        );

        let (tasks, index) = self.plan(declarations);
        let mut failed: BTreeSet<PathBuf> = BTreeSet::new();
        let mut report = PassReport::default();

        for (path, task) in tasks {
            let task_started = Instant::now();
            let blocker = prerequisites(&task.desired, &index)
                .into_iter()
                .find(|p| matches!(p, Prerequisite::Acl(_)) && failed.contains(p.path()));

            let (outcome, phases) = if let Some(prerequisite) = blocker {
                warn!(
                    event = "Reconcile",
                    phase = "Order",
                    path = %path.display(),
                    prerequisite = %prerequisite,
                    "skipping task, prerequisite did not succeed"
                );
                let prerequisite = prerequisite.path().to_path_buf();
                (TaskOutcome::Blocked { prerequisite }, None)
            } else if let Some(error) = task.error {
                (TaskOutcome::Failed { error }, None)
            } else {
                let mut phases = PhaseDurations::default();
                let outcome = self.execute(&task.desired, reader, writer, &mut phases);
                (outcome, Some(phases))
            };

            if outcome.is_failure() {
                failed.insert(path.clone());
            }

            let duration = task_started.elapsed();
            let stats = TaskStats {
                path: path.display().to_string(),
                outcome: outcome.kind(),
                duration,
            };
            let phases = phases.map(|p| p.to_metrics(duration));
            metrics::record_task(&stats, phases.as_ref());

            report.tasks.push(TaskReport {
                path,
                synthesized: task.synthesized,
                outcome,
                duration,
            });
        }

        report.duration = started.elapsed();
        let stats = report.stats();
        info!(
            event = "Reconcile",
            phase = "Pass",
            tasks = stats.tasks,
            in_sync = stats.in_sync,
            changed = stats.changed,
            skipped = stats.skipped,
            failed = stats.failed,
            blocked = stats.blocked
        );
        metrics::record_pass(&stats);
        report
    }

    fn plan(
        &self,
        declarations: &[DesiredState],
    ) -> (BTreeMap<PathBuf, PlannedTask>, DeclarationIndex) {
        let mut index =
            DeclarationIndex::from_parts(declarations, self.file_intents.iter().cloned());
        let mut tasks: BTreeMap<PathBuf, PlannedTask> = BTreeMap::new();

        for decl in declarations {
            match tasks.entry(decl.path().to_path_buf()) {
                Entry::Vacant(slot) => {
                    slot.insert(PlannedTask {
                        desired: decl.clone(),
                        synthesized: false,
                        error: None,
                    });
                }
                Entry::Occupied(mut slot) => {
                    warn!(event = "Reconcile", phase = "Plan", path = %decl.path().display(), "duplicate declaration");
                    slot.get_mut().error = Some(AclError::InvalidDeclaration(format!(
                        "duplicate declaration for {}",
                        decl.path().display()
                    )));
                }
            }
        }

        // Deepest declarations first, so an object beneath several deep
        // declarations is claimed by its nearest declaring ancestor.
        let deep = declarations
            .iter()
            .filter(|d| d.is_deep_recursive())
            .sorted_by(|a, b| b.path().cmp(a.path()));
        for decl in deep {
            match expand(decl, &index) {
                Ok(children) => {
                    for child in children {
                        tasks
                            .entry(child.path().to_path_buf())
                            .or_insert_with(|| PlannedTask {
                                desired: child,
                                synthesized: true,
                                error: None,
                            });
                    }
                }
                Err(err) => {
                    warn!(event = "Reconcile", phase = "Expand", path = %decl.path().display(), error = %err);
                    if let Some(task) = tasks.get_mut(decl.path()) {
                        task.error.get_or_insert(err);
                    }
                }
            }
        }

        for path in tasks.keys() {
            index.add_acl(path.clone());
        }

        debug!(event = "Reconcile", phase = "Plan", tasks = tasks.len());
        (tasks, index)
    }

    fn execute<R, W>(
        &self,
        desired: &DesiredState,
        reader: &R,
        writer: &W,
        phases: &mut PhaseDurations,
    ) -> TaskOutcome
    where
        R: AclReader + ?Sized,
        W: AclWriter + ?Sized,
    {
        let path = desired.path();

        let lines = {
            let _timer = PhaseTimer::new(&mut phases.read);
            reader.read(path)
        };
        let lines = match lines {
            Ok(lines) => lines,
            Err(AclError::TargetMissing(msg)) => return missing(desired, msg),
            Err(error) => {
                warn!(event = "Reconcile", phase = "Read", path = %path.display(), error = %error);
                return TaskOutcome::Failed { error };
            }
        };

        let task = ReconciliationTask::new(desired.clone(), CurrentState::from_lines(lines));
        let verdict = {
            let _timer = PhaseTimer::new(&mut phases.evaluate);
            self.reconciler.evaluate_task(&task)
        };
        let Verdict::Apply(operation) = verdict else {
            return TaskOutcome::InSync;
        };

        if self.dry_run {
            info!(event = "Reconcile", phase = "Plan", path = %path.display(), operation = %operation, "dry run");
            return TaskOutcome::Planned { operation };
        }

        let applied = {
            let _timer = PhaseTimer::new(&mut phases.apply);
            writer.apply(&operation)
        };
        match applied {
            Ok(()) => {
                info!(event = "Reconcile", phase = "Apply", path = %path.display(), operation = %operation);
                TaskOutcome::Applied { operation }
            }
            Err(AclError::TargetMissing(msg)) => missing(desired, msg),
            Err(error) => {
                warn!(event = "Reconcile", phase = "Apply", path = %path.display(), error = %error);
                TaskOutcome::Failed { error }
            }
        }
    }
}

fn missing(desired: &DesiredState, msg: String) -> TaskOutcome {
    let path = desired.path();
    match desired.ignore_missing() {
        IgnoreMissing::Quiet => {
            debug!(event = "Reconcile", phase = "Read", path = %path.display(), "target missing, ignored");
            TaskOutcome::Skipped { notified: false }
        }
        IgnoreMissing::Notify => {
            warn!(event = "Reconcile", phase = "Read", path = %path.display(), "target missing, skipping");
            TaskOutcome::Skipped { notified: true }
        }
        IgnoreMissing::False => TaskOutcome::Failed {
            error: AclError::TargetMissing(msg),
        },
    }
}
