use log::{debug, trace, warn};
use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};
use std::{
    os::fd::{BorrowedFd, RawFd},
    sync::Mutex,
    time::Duration,
};

use super::{check_batch, check_fd, lock, AsPoller, InterestTable, PollerKind};
use crate::error::{Error, Result};
use crate::event::{Event, Interest};

/// Kernel-assisted poller. Interest is mirrored into an epoll instance, so
/// `wait_event` costs the number of ready descriptors, not watched ones.
pub struct EpollPoller {
    table: Mutex<InterestTable>,
    epoll: Epoll,
}

impl EpollPoller {
    pub fn new(capacity: usize) -> Result<Self> {
        let epoll = Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC).map_err(Error::Alloc)?;
        debug!("epoll poller created (capacity {})", capacity);
        Ok(Self {
            table: Mutex::new(InterestTable::new(capacity)),
            epoll,
        })
    }
}

fn to_epoll_flags(interest: Interest) -> EpollFlags {
    let mut flags = EpollFlags::empty();
    if interest.contains(Interest::READ) {
        flags |= EpollFlags::EPOLLIN;
    }
    if interest.contains(Interest::WRITE) {
        flags |= EpollFlags::EPOLLOUT;
    }
    if interest.contains(Interest::ERROR) {
        flags |= EpollFlags::EPOLLERR;
    }
    flags
}

fn from_epoll_flags(flags: EpollFlags) -> Interest {
    let mut ready = Interest::NONE;
    if flags.intersects(
        EpollFlags::EPOLLIN | EpollFlags::EPOLLPRI | EpollFlags::EPOLLRDHUP | EpollFlags::EPOLLHUP,
    ) {
        ready |= Interest::READ;
    }
    if flags.contains(EpollFlags::EPOLLOUT) {
        ready |= Interest::WRITE;
    }
    if flags.contains(EpollFlags::EPOLLERR) {
        ready |= Interest::ERROR;
    }
    ready
}

fn epoll_timeout(timeout_ms: i32) -> EpollTimeout {
    match u64::try_from(timeout_ms) {
        Ok(ms) => EpollTimeout::try_from(Duration::from_millis(ms)).unwrap_or(EpollTimeout::NONE),
        Err(_) => EpollTimeout::NONE,
    }
}

impl AsPoller for EpollPoller {
    fn kind(&self) -> PollerKind {
        PollerKind::Epoll
    }

    fn len(&self) -> usize {
        lock(&self.table).len()
    }

    fn capacity(&self) -> usize {
        lock(&self.table).capacity()
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        check_fd(event.fd)?;
        let mut table = lock(&self.table);

        // The caller owns the descriptor and keeps it open while registered.
        let fd = unsafe { BorrowedFd::borrow_raw(event.fd) };
        let mut ev = EpollEvent::new(to_epoll_flags(event.interest), event.fd as u64);
        let res = match table.check_room(event.fd)? {
            Some(_) => self.epoll.modify(fd, &mut ev),
            None => self.epoll.add(fd, ev),
        };
        if let Err(e) = res {
            warn!("epoll_ctl rejected fd {}: {}", event.fd, e);
            return Err(Error::Backend(e));
        }

        let slot = table.upsert(event)?;
        trace!("epoll: fd {} {}, watching {}", event.fd, slot, event.interest);
        Ok(())
    }

    /// A descriptor must be removed before it is closed. Once closed,
    /// `EPOLL_CTL_DEL` fails with `EBADF`, the error is returned, and the
    /// entry keeps its table slot.
    fn remove_event(&self, event: &Event) -> Result<()> {
        check_fd(event.fd)?;
        let mut table = lock(&self.table);
        if table.position(event.fd).is_none() {
            return Ok(());
        }

        let fd = unsafe { BorrowedFd::borrow_raw(event.fd) };
        if let Err(e) = self.epoll.delete(fd) {
            warn!("epoll_ctl(DEL) rejected fd {}: {}", event.fd, e);
            return Err(Error::Backend(e));
        }
        table.remove(event.fd);
        trace!("epoll: fd {} removed", event.fd);
        Ok(())
    }

    fn wait_event(&self, events: &mut [Event], timeout_ms: i32) -> Result<usize> {
        check_batch(events)?;
        // Nothing registered, so there is nothing to block on.
        if lock(&self.table).is_empty() {
            return Ok(0);
        }

        let mut raw = vec![EpollEvent::empty(); events.len()];
        let num_fds = self
            .epoll
            .wait(&mut raw, epoll_timeout(timeout_ms))
            .map_err(Error::Backend)?;

        for (dst, src) in events.iter_mut().zip(&raw[..num_fds]) {
            *dst = Event::with_ready(src.data() as RawFd, from_epoll_flags(src.events()));
        }
        trace!("epoll: {} ready", num_fds);
        Ok(num_fds)
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        debug!("epoll poller dropped ({} still registered)", lock(&self.table).len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hangup_and_priority_fold_into_read() {
        assert_eq!(from_epoll_flags(EpollFlags::EPOLLHUP), Interest::READ);
        assert_eq!(from_epoll_flags(EpollFlags::EPOLLRDHUP), Interest::READ);
        assert_eq!(from_epoll_flags(EpollFlags::EPOLLPRI), Interest::READ);
        assert_eq!(
            from_epoll_flags(EpollFlags::EPOLLOUT | EpollFlags::EPOLLERR),
            Interest::WRITE | Interest::ERROR
        );
    }

    #[test]
    fn interest_maps_to_flags() {
        let flags = to_epoll_flags(Interest::READ | Interest::ERROR);
        assert_eq!(flags, EpollFlags::EPOLLIN | EpollFlags::EPOLLERR);
    }

    #[test]
    fn registering_a_closed_fd_is_rejected() {
        let poller = EpollPoller::new(4).unwrap();
        // fd numbers this high are never open in a test process.
        let err = poller.update_event(&Event::new(100_000, Interest::READ));
        assert_eq!(err, Err(Error::Backend(nix::errno::Errno::EBADF)));
        assert!(poller.is_empty());
    }
}
