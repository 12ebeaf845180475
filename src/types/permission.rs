//! Read/write/execute permission triples.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AclError;

/// The three permission bits of an ACL entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Permission {
    read: bool,
    write: bool,
    execute: bool,
}

impl Permission {
    pub const NONE: Permission = Permission::new(false, false, false);
    pub const ALL: Permission = Permission::new(true, true, true);

    pub const fn new(read: bool, write: bool, execute: bool) -> Self {
        Permission {
            read,
            write,
            execute,
        }
    }

    /// Decode an octal digit, 4 = read, 2 = write, 1 = execute.
    pub fn from_octal(digit: u32) -> Option<Self> {
        (digit <= 7).then(|| Permission::new(digit & 4 != 0, digit & 2 != 0, digit & 1 != 0))
    }

    pub fn octal(&self) -> u32 {
        (u32::from(self.read) << 2) | (u32::from(self.write) << 1) | u32::from(self.execute)
    }

    pub fn read(&self) -> bool {
        self.read
    }

    pub fn write(&self) -> bool {
        self.write
    }

    pub fn execute(&self) -> bool {
        self.execute
    }

    fn parse_symbolic(s: &str) -> Option<Self> {
        let mut perm = Permission::NONE;
        for c in s.chars() {
            match c {
                '-' => {}
                'r' if !perm.read => perm.read = true,
                'w' if !perm.write => perm.write = true,
                'x' if !perm.execute => perm.execute = true,
                _ => return None,
            }
        }
        Some(perm)
    }

    // `111`, `101`, ... as positional r/w/x flags.
    fn parse_flags(s: &str) -> Option<Self> {
        let flags: Vec<bool> = s
            .chars()
            .map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect::<Option<_>>()?;
        match flags.as_slice() {
            [r, w, x] => Some(Permission::new(*r, *w, *x)),
            _ => None,
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' }
        )
    }
}

impl FromStr for Permission {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(perm) = c.to_digit(8).and_then(Permission::from_octal) {
                return Ok(perm);
            }
        }

        Permission::parse_flags(s)
            .or_else(|| Permission::parse_symbolic(s))
            .ok_or_else(|| AclError::MalformedEntry(format!(r#"Invalid permission set "{s}""#)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        octal_zero = { "0", "---" },
        octal_one = { "1", "--x" },
        octal_four = { "4", "r--" },
        octal_five = { "5", "r-x" },
        octal_six = { "6", "rw-" },
        octal_seven = { "7", "rwx" },
        flags_all = { "111", "rwx" },
        flags_read_exec = { "101", "r-x" },
        flags_none = { "000", "---" },
        symbolic_full = { "rwx", "rwx" },
        symbolic_dashes = { "r-x", "r-x" },
        symbolic_short = { "rw", "rw-" },
        symbolic_reordered = { "xr", "r-x" },
        symbolic_only_dashes = { "---", "---" },
        symbolic_empty = { "", "---" },
    )]
    fn test_permission_from_str(input: &str, expected: &str) {
        let perm: Permission = input.parse().unwrap();
        assert_eq!(perm.to_string(), expected);
    }

    #[parameterized(
        octal_eight = { "8" },
        octal_with_garbage = { "7x" },
        underscore = { "-_-" },
        repeated = { "rr" },
        upper_case = { "RWX" },
        conditional_execute = { "rwX" },
        flags_too_long = { "1111" },
        flags_bad_digit = { "121" },
    )]
    fn test_permission_rejects(input: &str) {
        let err = input.parse::<Permission>().unwrap_err();
        assert!(matches!(err, AclError::MalformedEntry(msg) if msg.contains("Invalid permission set")));
    }

    #[test]
    fn test_permission_octal_roundtrip() {
        for digit in 0..=7 {
            assert_eq!(Permission::from_octal(digit).unwrap().octal(), digit);
        }
        assert!(Permission::from_octal(8).is_none());
    }

    #[test]
    fn test_permission_accessors() {
        let perm = Permission::new(true, false, true);
        assert!(perm.read());
        assert!(!perm.write());
        assert!(perm.execute());
        assert_eq!(Permission::ALL.to_string(), "rwx");
        assert_eq!(Permission::NONE.to_string(), "---");
    }
}
