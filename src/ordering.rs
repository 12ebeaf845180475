//! Prerequisite edges between declarations.
//!
//! Nothing here touches entry data or the filesystem. The caller passes a
//! [`DeclarationIndex`] describing what else has been declared and gets back
//! the paths that must be handled first; enforcing that order is up to the
//! scheduler.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::DesiredState;

/// The kind of object a file-creation intent will create.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    File,
    Directory,
}

/// An externally declared "create this object" intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIntent {
    pub path: PathBuf,
    #[serde(default)]
    pub kind: FileKind,
}

impl FileIntent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        FileIntent {
            path: path.into(),
            kind: FileKind::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        FileIntent {
            path: path.into(),
            kind: FileKind::Directory,
        }
    }
}

/// Something that must be satisfied before an ACL declaration is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Prerequisite {
    /// Another ACL declaration
    Acl(PathBuf),
    /// A file-creation intent
    File(PathBuf),
}

impl Prerequisite {
    pub fn path(&self) -> &Path {
        match self {
            Prerequisite::Acl(p) | Prerequisite::File(p) => p,
        }
    }
}

impl Display for Prerequisite {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Prerequisite::Acl(p) => write!(f, "acl {}", p.display()),
            Prerequisite::File(p) => write!(f, "file {}", p.display()),
        }
    }
}

/// The set of declarations visible to the orderer and the expander.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationIndex {
    acls: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, FileKind>,
}

impl DeclarationIndex {
    pub fn new() -> Self {
        DeclarationIndex::default()
    }

    /// Index the paths of `declarations` and the given file intents.
    pub fn from_parts<'a, D, F>(declarations: D, intents: F) -> Self
    where
        D: IntoIterator<Item = &'a DesiredState>,
        F: IntoIterator<Item = FileIntent>,
    {
        let mut index = DeclarationIndex::new();
        for decl in declarations {
            index.add_acl(decl.path());
        }
        for intent in intents {
            index.add_file_intent(intent);
        }
        index
    }

    /// Returns `false` if an ACL declaration on `path` was already indexed.
    pub fn add_acl(&mut self, path: impl Into<PathBuf>) -> bool {
        self.acls.insert(path.into())
    }

    pub fn add_file_intent(&mut self, intent: FileIntent) {
        self.files.insert(intent.path, intent.kind);
    }

    pub fn has_acl(&self, path: &Path) -> bool {
        self.acls.contains(path)
    }

    pub fn file_kind(&self, path: &Path) -> Option<FileKind> {
        self.files.get(path).copied()
    }

    /// The closest strict ancestor of `path` with an ACL declaration.
    pub fn nearest_acl_ancestor(&self, path: &Path) -> Option<&Path> {
        path.ancestors()
            .skip(1)
            .find_map(|p| self.acls.get(p).map(PathBuf::as_path))
    }

    /// The closest strict ancestor of `path` with a file-creation intent.
    pub fn nearest_file_ancestor(&self, path: &Path) -> Option<&Path> {
        path.ancestors()
            .skip(1)
            .find_map(|p| self.files.get_key_value(p).map(|(k, _)| k.as_path()))
    }

    /// File intents strictly beneath `path`, in path order.
    pub fn files_beneath<'a>(
        &'a self,
        path: &'a Path,
    ) -> impl Iterator<Item = (&'a Path, FileKind)> + 'a {
        self.files
            .range::<Path, _>((Bound::Excluded(path), Bound::Unbounded))
            .take_while(move |(p, _)| p.starts_with(path))
            .map(|(p, kind)| (p.as_path(), *kind))
    }
}

/// Whether `path` lies strictly beneath `ancestor`.
pub fn is_descendant(ancestor: &Path, path: &Path) -> bool {
    path != ancestor && path.starts_with(ancestor)
}

/// Everything that must be satisfied before `desired` is applied.
///
/// - the nearest ancestor ACL declaration, and the nearest ancestor file
///   intent, each found by walking up from the parent of `desired`'s path;
/// - a file intent on the same path, so the object exists first;
/// - when `desired` is recursive (lazy or deep), every file intent beneath it.
///
/// A declaration never depends on itself. The result is sorted and has no
/// duplicates.
pub fn prerequisites(desired: &DesiredState, index: &DeclarationIndex) -> Vec<Prerequisite> {
    let path = desired.path();
    let mut required = BTreeSet::new();

    if let Some(ancestor) = index.nearest_acl_ancestor(path) {
        required.insert(Prerequisite::Acl(ancestor.to_path_buf()));
    }
    if let Some(ancestor) = index.nearest_file_ancestor(path) {
        required.insert(Prerequisite::File(ancestor.to_path_buf()));
    }
    if index.file_kind(path).is_some() {
        required.insert(Prerequisite::File(path.to_path_buf()));
    }
    if desired.recursive() {
        for (descendant, _) in index.files_beneath(path) {
            required.insert(Prerequisite::File(descendant.to_path_buf()));
        }
    }

    required.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AclEntry, RecurseMode};
    use yare::parameterized;

    fn declare(path: &str) -> DesiredState {
        let entry: AclEntry = "user:blub:r-x".parse().unwrap();
        DesiredState::new(path, vec![entry]).unwrap()
    }

    fn index() -> DeclarationIndex {
        let acls = [declare("/opt"), declare("/opt/app/data")];
        DeclarationIndex::from_parts(
            &acls,
            [
                FileIntent::directory("/opt/app"),
                FileIntent::directory("/opt/app/data"),
                FileIntent::file("/opt/app/data/a.txt"),
                FileIntent::directory("/opt/app/data/sub"),
                FileIntent::file("/opt/app/data/sub/b.txt"),
                FileIntent::file("/opt/app-other/c.txt"),
            ],
        )
    }

    #[parameterized(
        child = { "/a", "/a/b", true },
        grandchild = { "/a", "/a/b/c", true },
        same = { "/a", "/a", false },
        sibling_prefix = { "/a", "/ab", false },
        parent = { "/a/b", "/a", false },
        root = { "/", "/etc", true },
    )]
    fn test_is_descendant(ancestor: &str, path: &str, expected: bool) {
        assert_eq!(is_descendant(Path::new(ancestor), Path::new(path)), expected);
    }

    #[test]
    fn test_nearest_acl_ancestor_stops_at_first_match() {
        let index = index();
        assert_eq!(
            index.nearest_acl_ancestor(Path::new("/opt/app/data/sub/b.txt")),
            Some(Path::new("/opt/app/data"))
        );
        assert_eq!(
            index.nearest_acl_ancestor(Path::new("/opt/app/data")),
            Some(Path::new("/opt"))
        );
        assert_eq!(index.nearest_acl_ancestor(Path::new("/opt")), None);
        assert_eq!(index.nearest_acl_ancestor(Path::new("/")), None);
    }

    #[test]
    fn test_files_beneath_excludes_self_and_siblings() {
        let index = index();
        let found: Vec<&Path> = index
            .files_beneath(Path::new("/opt/app"))
            .map(|(p, _)| p)
            .collect();
        assert_eq!(
            found,
            vec![
                Path::new("/opt/app/data"),
                Path::new("/opt/app/data/a.txt"),
                Path::new("/opt/app/data/sub"),
                Path::new("/opt/app/data/sub/b.txt"),
            ]
        );
    }

    #[test]
    fn test_prerequisites_non_recursive() {
        let index = index();
        let reqs = prerequisites(&declare("/opt/app/data"), &index);
        assert_eq!(
            reqs,
            vec![
                Prerequisite::Acl(PathBuf::from("/opt")),
                Prerequisite::File(PathBuf::from("/opt/app")),
                Prerequisite::File(PathBuf::from("/opt/app/data")),
            ]
        );
    }

    #[parameterized(
        lazy = { RecurseMode::Lazy },
        deep = { RecurseMode::Deep },
    )]
    fn test_prerequisites_recursive_includes_descendant_files(mode: RecurseMode) {
        let index = index();
        let decl = declare("/opt/app/data").with_recursion(true, mode);
        let reqs = prerequisites(&decl, &index);
        let rendered: Vec<String> = reqs.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "acl /opt",
                "file /opt/app",
                "file /opt/app/data",
                "file /opt/app/data/a.txt",
                "file /opt/app/data/sub",
                "file /opt/app/data/sub/b.txt",
            ]
        );
    }

    #[test]
    fn test_prerequisites_never_include_self() {
        let index = index();
        for path in ["/opt", "/opt/app/data"] {
            let decl = declare(path).with_recursion(true, RecurseMode::Lazy);
            let reqs = prerequisites(&decl, &index);
            assert!(!reqs.contains(&Prerequisite::Acl(PathBuf::from(path))));
        }
    }

    #[test]
    fn test_prerequisites_empty_index() {
        let reqs = prerequisites(&declare("/srv/www"), &DeclarationIndex::new());
        assert!(reqs.is_empty());
    }

    #[test]
    fn test_add_acl_reports_duplicates() {
        let mut index = DeclarationIndex::new();
        assert!(index.add_acl("/srv"));
        assert!(!index.add_acl("/srv"));
        assert!(index.has_acl(Path::new("/srv")));
    }
}
