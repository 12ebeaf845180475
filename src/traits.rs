use std::path::Path;

use crate::error::AclError;
use crate::types::ApplyOperation;

/// Reads the live ACL of a path.
pub trait AclReader {
    /// Return the ACL of `path` in the native listing format, one entry per
    /// line. Comment lines may be included; they are dropped on parse.
    ///
    /// Must return [`AclError::TargetMissing`] when `path` does not exist so
    /// that the caller can apply the declaration's missing-target policy.
    fn read(&self, path: &Path) -> Result<Vec<String>, AclError>;
}

/// Mutates the live ACL of a path.
pub trait AclWriter {
    /// Apply `op` as a whole. There is no per-entry result: the operation
    /// either succeeded or it did not.
    fn apply(&self, op: &ApplyOperation) -> Result<(), AclError>;
}

impl<T: AclReader + ?Sized> AclReader for &T {
    fn read(&self, path: &Path) -> Result<Vec<String>, AclError> {
        (**self).read(path)
    }
}

impl<T: AclWriter + ?Sized> AclWriter for &T {
    fn apply(&self, op: &ApplyOperation) -> Result<(), AclError> {
        (**self).apply(op)
    }
}
