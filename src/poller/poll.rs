use log::{debug, trace};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::{os::fd::BorrowedFd, sync::Mutex, time::Duration};

use super::{check_batch, check_fd, lock, AsPoller, InterestTable, PollerKind};
use crate::error::{Error, Result};
use crate::event::{Event, Interest};

/// Descriptor-array poller. Registration is purely a table edit; every wait
/// resubmits a copy of the table to `poll(2)`.
///
/// A wait only sees the table as it was when the call started. Descriptors
/// added while a wait is in flight are picked up by the next call. Only the
/// first `events.len()` registered descriptors are submitted per wait.
pub struct PollPoller {
    table: Mutex<InterestTable>,
}

impl PollPoller {
    pub fn new(capacity: usize) -> Result<Self> {
        debug!("poll poller created (capacity {})", capacity);
        Ok(Self {
            table: Mutex::new(InterestTable::new(capacity)),
        })
    }
}

fn to_poll_flags(interest: Interest) -> PollFlags {
    let mut flags = PollFlags::empty();
    if interest.contains(Interest::READ) {
        flags |= PollFlags::POLLIN;
    }
    if interest.contains(Interest::WRITE) {
        flags |= PollFlags::POLLOUT;
    }
    if interest.contains(Interest::ERROR) {
        flags |= PollFlags::POLLERR;
    }
    flags
}

fn from_poll_flags(flags: PollFlags) -> Interest {
    let mut ready = Interest::NONE;
    // A peer half-close arrives as POLLHUP since POLLRDHUP is never requested.
    if flags.intersects(PollFlags::POLLIN | PollFlags::POLLPRI | PollFlags::POLLHUP) {
        ready |= Interest::READ;
    }
    if flags.contains(PollFlags::POLLOUT) {
        ready |= Interest::WRITE;
    }
    // POLLNVAL: the descriptor was closed while still registered.
    if flags.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
        ready |= Interest::ERROR;
    }
    ready
}

fn poll_timeout(timeout_ms: i32) -> PollTimeout {
    match u64::try_from(timeout_ms) {
        Ok(ms) => PollTimeout::try_from(Duration::from_millis(ms)).unwrap_or(PollTimeout::NONE),
        Err(_) => PollTimeout::NONE,
    }
}

impl AsPoller for PollPoller {
    fn kind(&self) -> PollerKind {
        PollerKind::Poll
    }

    fn len(&self) -> usize {
        lock(&self.table).len()
    }

    fn capacity(&self) -> usize {
        lock(&self.table).capacity()
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        check_fd(event.fd)?;
        let slot = lock(&self.table).upsert(event)?;
        trace!("poll: fd {} {}, watching {}", event.fd, slot, event.interest);
        Ok(())
    }

    fn remove_event(&self, event: &Event) -> Result<()> {
        check_fd(event.fd)?;
        if lock(&self.table).remove(event.fd).is_some() {
            trace!("poll: fd {} removed", event.fd);
        }
        Ok(())
    }

    fn wait_event(&self, events: &mut [Event], timeout_ms: i32) -> Result<usize> {
        check_batch(events)?;
        let snapshot: Vec<Event> = {
            let table = lock(&self.table);
            let n = events.len().min(table.len());
            table.entries()[..n].to_vec()
        };
        if snapshot.is_empty() {
            return Ok(0);
        }

        let mut pollfds: Vec<PollFd> = snapshot
            .iter()
            .map(|e| {
                let fd = unsafe { BorrowedFd::borrow_raw(e.fd) };
                PollFd::new(fd, to_poll_flags(e.interest))
            })
            .collect();
        let num_fds = poll(&mut pollfds, poll_timeout(timeout_ms)).map_err(Error::Backend)?;
        if num_fds == 0 {
            return Ok(0);
        }

        let mut filled = 0;
        for (pfd, entry) in pollfds.iter().zip(&snapshot) {
            let ready = pfd.revents().map(from_poll_flags).unwrap_or_default();
            if ready.is_empty() {
                continue;
            }
            events[filled] = Event::with_ready(entry.fd, ready);
            filled += 1;
        }
        trace!("poll: {} ready of {} submitted", filled, snapshot.len());
        Ok(filled)
    }
}
