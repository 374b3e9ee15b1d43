//! The vocabulary shared by every backend: what a caller is interested in,
//! and what a wait call found.
//!
//! The same `Event` type is used both ways. On registration only `fd` and
//! `interest` are read; in a wait batch only `fd` and `ready` are meaningful.
use std::{fmt, ops, os::fd::RawFd};

/// Bitmask of readiness conditions. Bit values are part of the public
/// contract: READ = 1, WRITE = 2, ERROR = 4.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interest(u8);

impl Interest {
    pub const NONE: Interest = Interest(0);
    pub const READ: Interest = Interest(1);
    pub const WRITE: Interest = Interest(2);
    pub const ERROR: Interest = Interest(4);

    const ALL: u8 = 1 | 2 | 4;

    /// Returns `None` if any bit outside READ|WRITE|ERROR is set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL != 0 {
            None
        } else {
            Some(Interest(bits))
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Interest) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Interest) -> bool {
        self.0 & other.0 != 0
    }
}

impl ops::BitOr for Interest {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Interest(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for Interest {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names = [
            (Interest::READ, "READ"),
            (Interest::WRITE, "WRITE"),
            (Interest::ERROR, "ERROR"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interest({})", self)
    }
}

/// One registered interest, or one entry of a readiness batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Event {
    pub fd: RawFd,
    pub interest: Interest,
    pub ready: Interest,
}

impl Event {
    pub fn new(fd: RawFd, interest: Interest) -> Self {
        Self {
            fd,
            interest,
            ready: Interest::NONE,
        }
    }

    pub(crate) fn with_ready(fd: RawFd, ready: Interest) -> Self {
        Self {
            fd,
            interest: Interest::NONE,
            ready,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.ready.contains(Interest::READ)
    }

    pub fn is_writable(&self) -> bool {
        self.ready.contains(Interest::WRITE)
    }

    pub fn is_error(&self) -> bool {
        self.ready.contains(Interest::ERROR)
    }
}
