//! Deep-mode expansion of a recursive declaration into per-path leaf tasks.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::AclError;
use crate::ordering::{DeclarationIndex, FileKind};
use crate::types::{AclEntry, DesiredState};

/// Drop default-scope entries, which mean nothing on a non-directory.
///
/// ```rust
/// use posix_acl_core::{parse_entries, strip_default_entries};
/// let entries = parse_entries(["user:foo:rwx", "default:user:foo:---"]).unwrap();
/// let kept = strip_default_entries(&entries);
/// assert_eq!(kept, parse_entries(["user:foo:rwx"]).unwrap());
/// ```
pub fn strip_default_entries(entries: &[AclEntry]) -> Vec<AclEntry> {
    entries.iter().filter(|e| !e.is_default()).cloned().collect()
}

/// One leaf declaration per object beneath `desired`'s path.
///
/// Only recursive declarations in [`RecurseMode::Deep`](crate::RecurseMode::Deep)
/// expand; anything else yields no children. Objects are discovered by
/// walking the tree (symlinks are not descended into, but a link to a
/// directory counts as a directory) and from file intents in
/// `index` that lie beneath the path, so objects that do not exist yet still
/// get a task. Each path appears once. Children inherit the action, entries
/// and missing-target policy, never recurse themselves, and lose their default
/// entries unless they are directories. A non-directory left with no entries
/// at all is skipped.
pub fn expand(
    desired: &DesiredState,
    index: &DeclarationIndex,
) -> Result<Vec<DesiredState>, AclError> {
    if !desired.is_deep_recursive() {
        return Ok(Vec::new());
    }

    let root = desired.path();
    let mut discovered: BTreeMap<PathBuf, bool> = BTreeMap::new();

    if root.is_dir() {
        for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
            let entry = entry?;
            // The native tools act on a link's target, so classify by it.
            discovered.insert(entry.path().to_path_buf(), entry.path().is_dir());
        }
    }
    let walked = discovered.len();

    for (path, kind) in index.files_beneath(root) {
        discovered
            .entry(path.to_path_buf())
            .or_insert(kind == FileKind::Directory);
    }

    debug!(
        event = "Reconcile",
        phase = "Expand",
        path = %root.display(),
        walked = walked,
        discovered = discovered.len()
    );

    let file_entries = strip_default_entries(desired.entries());
    let children = discovered
        .into_iter()
        .filter_map(|(path, is_dir)| {
            if is_dir {
                return Some(desired.child(path, desired.entries().to_vec()));
            }
            if file_entries.is_empty() {
                debug!(event = "Reconcile", phase = "Expand", path = %path.display(), skipped = "only default entries");
                return None;
            }
            Some(desired.child(path, file_entries.clone()))
        })
        .collect();

    Ok(children)
}
