//! Exclusive resource flags for conversion jobs.
//!
//! A conversion can occupy machine-wide resources that tolerate only one
//! user at a time: a hardware encoder session, the optical drive, a
//! throughput-limited network share. Each job carries a small bitset of
//! such classes, fixed at creation; the dispatch loop keeps jobs with
//! intersecting flag sets from running at the same time.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use thiserror::Error;

/// Error for a resource class name that is not known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown exclusive resource class: '{0}'")]
pub struct UnknownFlagError(pub String);

/// Bitset of exclusive resource classes occupied by a running job.
///
/// An empty set means the job only consumes CPU and conflicts with nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConversionFlags(u32);

impl ConversionFlags {
    /// No exclusive resources.
    pub const NONE: ConversionFlags = ConversionFlags(0);
    /// A hardware encoder session (NVENC and friends).
    pub const HW_ENCODER: ConversionFlags = ConversionFlags(1);
    /// The optical disc drive.
    pub const OPTICAL_DRIVE: ConversionFlags = ConversionFlags(1 << 1);
    /// A bandwidth-limited network share.
    pub const NETWORK_SHARE: ConversionFlags = ConversionFlags(1 << 2);

    /// Known classes with their preset names, in bit order.
    const KNOWN: &'static [(ConversionFlags, &'static str)] = &[
        (Self::HW_ENCODER, "hw-encoder"),
        (Self::OPTICAL_DRIVE, "optical-drive"),
        (Self::NETWORK_SHARE, "network-share"),
    ];

    /// Whether no flag is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether at least one flag is shared with `other`.
    pub fn intersects(self, other: ConversionFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every flag of `other` is also set on `self`.
    pub fn contains(self, other: ConversionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Parse a single resource class name (case-insensitive).
    pub fn from_name(name: &str) -> Option<ConversionFlags> {
        Self::KNOWN
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(flag, _)| *flag)
    }

    /// Parse a list of resource class names into a combined flag set.
    ///
    /// Unknown names are rejected rather than ignored, so a misspelled
    /// class in a preset cannot silently lose its exclusivity.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<ConversionFlags, UnknownFlagError> {
        let mut flags = ConversionFlags::NONE;
        for name in names {
            let name = name.as_ref();
            match Self::from_name(name) {
                Some(flag) => flags |= flag,
                None => return Err(UnknownFlagError(name.to_string())),
            }
        }
        Ok(flags)
    }

    /// Names of the set flags, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::KNOWN
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for ConversionFlags {
    type Output = ConversionFlags;

    fn bitor(self, rhs: ConversionFlags) -> ConversionFlags {
        ConversionFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConversionFlags {
    fn bitor_assign(&mut self, rhs: ConversionFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ConversionFlags {
    type Output = ConversionFlags;

    fn bitand(self, rhs: ConversionFlags) -> ConversionFlags {
        ConversionFlags(self.0 & rhs.0)
    }
}

impl fmt::Display for ConversionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.names().join("|"))
        }
    }
}
