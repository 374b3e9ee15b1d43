//! The readiness poller facade and its backends.
//!
//! `Poller` owns exactly one backend, picked at creation by `PollerKind`, and
//! forwards every call to it. Code using a `Poller` is never tied to a
//! specific backend.
mod interface;
mod table;

pub use interface::AsPoller;
pub(crate) use table::InterestTable;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use epoll::EpollPoller;

mod poll;
pub use poll::PollPoller;

mod select;
pub use select::SelectPoller;

use std::{
    fmt,
    os::fd::RawFd,
    str::FromStr,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::Event;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PollerKind {
    /// Kernel-side registration (Linux only).
    Epoll,
    /// Descriptor array resubmitted on every wait.
    Poll,
    /// Read/write/except bitsets.
    Select,
}

impl fmt::Display for PollerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Epoll => "epoll",
            Self::Poll => "poll",
            Self::Select => "select",
        };
        f.write_str(s)
    }
}

impl FromStr for PollerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "epoll" => Ok(Self::Epoll),
            "poll" => Ok(Self::Poll),
            "select" => Ok(Self::Select),
            _ => Err(Error::InvalidArgument("unknown poller kind")),
        }
    }
}

pub struct Poller {
    kind: PollerKind,
    backend: Box<dyn AsPoller>,
}

impl Poller {
    /// Create a poller able to watch `capacity_hint` descriptors. Values
    /// below 1 are raised to 1. The capacity never changes afterwards.
    pub fn new(kind: PollerKind, capacity_hint: i32) -> Result<Self> {
        let capacity = usize::try_from(capacity_hint).unwrap_or(0).max(1);
        let backend: Box<dyn AsPoller> = match kind {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            PollerKind::Epoll => Box::new(EpollPoller::new(capacity)?),
            #[cfg(not(any(target_os = "linux", target_os = "android")))]
            PollerKind::Epoll => return Err(Error::Unsupported(kind)),
            PollerKind::Poll => Box::new(PollPoller::new(capacity)?),
            PollerKind::Select => Box::new(SelectPoller::new(capacity)?),
        };
        Ok(Self { kind, backend })
    }

    pub fn kind(&self) -> PollerKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.backend.capacity()
    }

    pub fn add_event(&self, event: &Event) -> Result<()> {
        self.backend.add_event(event)
    }

    pub fn update_event(&self, event: &Event) -> Result<()> {
        self.backend.update_event(event)
    }

    pub fn remove_event(&self, event: &Event) -> Result<()> {
        self.backend.remove_event(event)
    }

    /// Wait for readiness. `events.len()` is the most that will be returned;
    /// the ready entries are written to the front of `events`.
    pub fn wait_event(&self, events: &mut [Event], timeout_ms: i32) -> Result<usize> {
        self.backend.wait_event(events, timeout_ms)
    }
}

impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

pub(crate) fn check_fd(fd: RawFd) -> Result<()> {
    if fd < 0 {
        return Err(Error::InvalidArgument("negative file descriptor"));
    }
    Ok(())
}

pub(crate) fn check_batch(events: &[Event]) -> Result<()> {
    if events.is_empty() {
        return Err(Error::InvalidArgument("event batch must hold at least one entry"));
    }
    Ok(())
}

/// Every mutation leaves the guarded state consistent before it can panic,
/// so a poisoned lock is still safe to use.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
