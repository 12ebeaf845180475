//! `getfacl`/`setfacl` backed collaborators.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use itertools::Itertools;
use tracing::debug;

use crate::error::AclError;
use crate::traits::{AclReader, AclWriter};
use crate::types::{AclChange, ApplyOperation, Recursion};

/// Reads and writes ACLs by running the native ACL tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaclCommand {
    getfacl: PathBuf,
    setfacl: PathBuf,
}

impl Default for FaclCommand {
    fn default() -> Self {
        FaclCommand {
            getfacl: PathBuf::from("getfacl"),
            setfacl: PathBuf::from("setfacl"),
        }
    }
}

impl FaclCommand {
    pub fn new() -> Self {
        FaclCommand::default()
    }

    pub fn with_getfacl(mut self, program: impl Into<PathBuf>) -> Self {
        self.getfacl = program.into();
        self
    }

    pub fn with_setfacl(mut self, program: impl Into<PathBuf>) -> Self {
        self.setfacl = program.into();
        self
    }

    pub fn read_args(path: &Path) -> Vec<OsString> {
        vec![
            "--absolute-names".into(),
            "--no-effective".into(),
            path.as_os_str().to_owned(),
        ]
    }

    /// `setfacl` arguments for `op`. `-R` is only passed for native recursion.
    pub fn apply_args(op: &ApplyOperation) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if op.recursion() == Recursion::Native {
            args.push("-R".into());
        }
        match op.change() {
            AclChange::Modify(entries) => {
                args.push("-m".into());
                args.push(entries.iter().join(",").into());
            }
            AclChange::Remove(keys) => {
                args.push("-x".into());
                args.push(keys.iter().map(|k| k.removal_spec()).join(",").into());
            }
            AclChange::Purge => args.push("-b".into()),
            AclChange::Replace(entries) => {
                args.push("--set".into());
                args.push(entries.iter().join(",").into());
            }
        }
        args.push(op.path().as_os_str().to_owned());
        args
    }

    fn run(&self, program: &Path, args: &[OsString]) -> Result<String, AclError> {
        debug!(event = "Command", program = %program.display(), args = ?args);
        let output = Command::new(program).args(args).output().map_err(|e| {
            AclError::CommandFailure(format!("failed to run {}: {e}", program.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AclError::CommandFailure(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// Follows links: a dangling link is a missing target.
fn ensure_exists(path: &Path) -> Result<(), AclError> {
    match path.metadata() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(AclError::TargetMissing(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

impl AclReader for FaclCommand {
    fn read(&self, path: &Path) -> Result<Vec<String>, AclError> {
        ensure_exists(path)?;
        let stdout = self.run(&self.getfacl, &FaclCommand::read_args(path))?;
        Ok(stdout.lines().map(str::to_string).collect())
    }
}

impl AclWriter for FaclCommand {
    fn apply(&self, op: &ApplyOperation) -> Result<(), AclError> {
        ensure_exists(op.path())?;
        self.run(&self.setfacl, &FaclCommand::apply_args(op))?;
        Ok(())
    }
}
