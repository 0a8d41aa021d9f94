//! fzf version compatibility.
//!
//! The typed options in [`super::options`] follow the fzf man pages of a
//! specific release.  [`check`] compares an installed fzf against the table of
//! releases this crate has been written for and explains any mismatch.

use std::fmt;
use std::process::Command;
use std::str::FromStr;

use crate::error::{Error, Result};

/// `MAJOR.MINOR.PATCH`, ordered field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Same major and minor; patch releases don't change the flag set.
    pub fn is_compatible_with(self, other: Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl FromStr for SemVer {
    type Err = Error;

    /// Parses the leading `MAJOR.MINOR.PATCH`; anything after the patch
    /// digits (`-dev`, ` (brew)`, a commit hash) is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let fail = || Error::VersionParse(s.to_string());

        let mut parts = s.trim_start().splitn(3, '.');
        let mut number = |digits_only: bool| -> Option<u32> {
            let part = parts.next()?;
            let end = part
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(part.len());
            if end == 0 || (digits_only && end != part.len()) {
                return None;
            }
            part[..end].parse().ok()
        };

        let major = number(true).ok_or_else(fail)?;
        let minor = number(true).ok_or_else(fail)?;
        let patch = number(false).ok_or_else(fail)?;
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// `(fzf release, fzf-but-typed release written against it)`, oldest first.
pub const SUPPORTED: &[(SemVer, SemVer)] = &[
    (SemVer::new(0, 42, 0), SemVer::new(0, 1, 0)),
    (SemVer::new(0, 43, 0), SemVer::new(0, 2, 0)),
];

/// Outcome of [`check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    Incompatible {
        /// Newest fzf this build targets.
        targeted: SemVer,
        found: SemVer,
        /// An earlier release of this crate that targeted `found`'s series.
        previously_supported_by: Option<SemVer>,
    },
}

impl Compatibility {
    pub fn is_compatible(&self) -> bool {
        matches!(self, Compatibility::Compatible)
    }
}

impl fmt::Display for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Compatibility::Incompatible {
            targeted,
            found,
            previously_supported_by,
        } = *self
        else {
            return write!(f, "installed fzf is compatible");
        };

        write!(
            f,
            "this wrapper follows the man pages of fzf {targeted}, but fzf {found} is installed. "
        )?;
        if found > targeted {
            write!(
                f,
                "Your fzf is newer, so some of its options have no typed counterpart here. "
            )?;
        } else {
            write!(
                f,
                "Your fzf is older, so some options exposed here may not exist in it yet. "
            )?;
        }
        if let Some(release) = previously_supported_by {
            write!(
                f,
                "fzf-but-typed {release} was written for your fzf series; pinning it is an \
                 alternative to upgrading fzf. "
            )?;
        }
        write!(
            f,
            "Most selections will still work; diff the fzf man pages of both versions to be sure."
        )
    }
}

/// Compare `found` with [`SUPPORTED`].
pub fn check(found: SemVer) -> Compatibility {
    check_against(found, SUPPORTED)
}

/// Compare `found` with a `(fzf, crate)` table sorted by fzf version.
/// An empty table accepts everything.
pub fn check_against(found: SemVer, table: &[(SemVer, SemVer)]) -> Compatibility {
    let Some(&(targeted, _)) = table.last() else {
        return Compatibility::Compatible;
    };
    let incompatible = |previously_supported_by| Compatibility::Incompatible {
        targeted,
        found,
        previously_supported_by,
    };

    // First entry strictly newer than `found`.
    let index = table.partition_point(|&(fzf, _)| fzf <= found);

    if index == 0 {
        return incompatible(None);
    }
    if found.is_compatible_with(targeted) {
        return Compatibility::Compatible;
    }
    if index == table.len() {
        return incompatible(None);
    }

    let neighbours = &table[index - 1..=index];
    let previous = neighbours
        .iter()
        .find(|&&(fzf, _)| found.is_compatible_with(fzf))
        .map(|&(_, release)| release);
    incompatible(previous)
}

/// Run `program --version` and parse what it prints.
pub fn installed_version(program: &str) -> Result<SemVer> {
    let output = Command::new(program).arg("--version").output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ExternalToolNotFound {
                program: program.to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    if !output.status.success() {
        return Err(Error::ExternalToolFailed {
            program: program.to_string(),
            code: output.status.code(),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout);
    tracing::debug!(program, version = %text.trim(), "queried selector version");
    text.trim().parse()
}
