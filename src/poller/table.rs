//! Fixed-capacity, ordered table of registered interests.
//!
//! Every backend keeps one of these behind its lock. Membership is a linear
//! scan by fd; the table never grows past the capacity it was created with.
//! Backends only touch entries through the methods below, so a different
//! storage strategy can be dropped in without changing them.
use std::{fmt, os::fd::RawFd};

use crate::error::{Error, Result};
use crate::event::Event;

/// What `upsert` did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The fd was new; the entry lives at this index.
    Inserted(usize),
    /// The fd was already present; the entry at this index was overwritten.
    Replaced(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted(idx) => write!(f, "added at slot {}", idx),
            Self::Replaced(idx) => write!(f, "updated at slot {}", idx),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterestTable {
    entries: Vec<Event>,
    capacity: usize,
}

impl InterestTable {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn position(&self, fd: RawFd) -> Option<usize> {
        self.entries.iter().position(|e| e.fd == fd)
    }

    pub fn entries(&self) -> &[Event] {
        &self.entries
    }

    /// Fails with `CapacityExceeded` when `fd` is new and the table is full;
    /// the caller can then skip any OS call. Does not modify the table.
    pub fn check_room(&self, fd: RawFd) -> Result<Option<usize>> {
        match self.position(fd) {
            Some(idx) => Ok(Some(idx)),
            None if self.is_full() => Err(Error::CapacityExceeded {
                capacity: self.capacity,
            }),
            None => Ok(None),
        }
    }

    /// Insert `event`, or overwrite the entry with the same fd.
    pub fn upsert(&mut self, event: &Event) -> Result<Slot> {
        let mut stored = *event;
        stored.ready = Default::default();
        match self.check_room(event.fd)? {
            Some(idx) => {
                self.entries[idx] = stored;
                Ok(Slot::Replaced(idx))
            }
            None => {
                self.entries.push(stored);
                Ok(Slot::Inserted(self.entries.len() - 1))
            }
        }
    }

    /// Remove the entry for `fd`, shifting the later entries down.
    pub fn remove(&mut self, fd: RawFd) -> Option<Event> {
        self.position(fd).map(|idx| self.entries.remove(idx))
    }

    /// Largest registered fd, or -1 when empty.
    pub fn max_fd(&self) -> RawFd {
        self.entries.iter().map(|e| e.fd).max().unwrap_or(-1)
    }
}
