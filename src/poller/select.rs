use log::{debug, trace};
use nix::sys::{
    select::{select, FdSet},
    time::{TimeVal, TimeValLike},
};
use std::{
    os::fd::{BorrowedFd, RawFd},
    sync::Mutex,
};

use super::{check_batch, check_fd, lock, AsPoller, InterestTable, PollerKind};
use crate::error::{Error, Result};
use crate::event::{Event, Interest};

const FD_SETSIZE: RawFd = nix::libc::FD_SETSIZE as RawFd;

struct SelectState {
    table: InterestTable,
    read: FdSet<'static>,
    write: FdSet<'static>,
    except: FdSet<'static>,
    /// -1 while the table is empty.
    max_fd: RawFd,
}

/// Bitset poller built on `select(2)`.
///
/// The three interest sets are the live registration. `select` overwrites
/// the sets it is given, so a wait always works on copies taken under the
/// lock and the live sets are never handed to the kernel.
pub struct SelectPoller {
    state: Mutex<SelectState>,
}

impl SelectPoller {
    pub fn new(capacity: usize) -> Result<Self> {
        debug!("select poller created (capacity {})", capacity);
        Ok(Self {
            state: Mutex::new(SelectState {
                table: InterestTable::new(capacity),
                read: FdSet::new(),
                write: FdSet::new(),
                except: FdSet::new(),
                max_fd: -1,
            }),
        })
    }

    /// Highest registered descriptor, or -1 if none.
    pub fn max_fd(&self) -> RawFd {
        lock(&self.state).max_fd
    }
}

// The caller owns the descriptor and keeps it open while it is registered.
fn borrow(fd: RawFd) -> BorrowedFd<'static> {
    unsafe { BorrowedFd::borrow_raw(fd) }
}

fn set_bit(set: &mut FdSet<'static>, fd: RawFd, on: bool) {
    if on {
        set.insert(borrow(fd));
    } else {
        set.remove(borrow(fd));
    }
}

fn check_fd_setsize(fd: RawFd) -> Result<()> {
    if fd >= FD_SETSIZE {
        return Err(Error::InvalidArgument("fd does not fit in an fd_set"));
    }
    Ok(())
}

fn select_timeout(timeout_ms: i32) -> Option<TimeVal> {
    if timeout_ms < 0 {
        None
    } else {
        Some(TimeVal::milliseconds(timeout_ms as i64))
    }
}

impl AsPoller for SelectPoller {
    fn kind(&self) -> PollerKind {
        PollerKind::Select
    }

    fn len(&self) -> usize {
        lock(&self.state).table.len()
    }

    fn capacity(&self) -> usize {
        lock(&self.state).table.capacity()
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        check_fd(event.fd)?;
        check_fd_setsize(event.fd)?;

        let mut guard = lock(&self.state);
        let state = &mut *guard;
        let slot = state.table.upsert(event)?;

        let fd = event.fd;
        set_bit(&mut state.read, fd, event.interest.contains(Interest::READ));
        set_bit(&mut state.write, fd, event.interest.contains(Interest::WRITE));
        set_bit(&mut state.except, fd, event.interest.contains(Interest::ERROR));
        if fd > state.max_fd {
            state.max_fd = fd;
        }
        trace!(
            "select: fd {} {}, watching {} (max fd {})",
            fd,
            slot,
            event.interest,
            state.max_fd
        );
        Ok(())
    }

    fn remove_event(&self, event: &Event) -> Result<()> {
        check_fd(event.fd)?;
        if event.fd >= FD_SETSIZE {
            // Could never have been registered.
            return Ok(());
        }

        let mut guard = lock(&self.state);
        let state = &mut *guard;
        if state.table.remove(event.fd).is_none() {
            return Ok(());
        }
        set_bit(&mut state.read, event.fd, false);
        set_bit(&mut state.write, event.fd, false);
        set_bit(&mut state.except, event.fd, false);
        // The removed fd may have been the maximum.
        state.max_fd = state.table.max_fd();
        trace!("select: fd {} removed (max fd {})", event.fd, state.max_fd);
        Ok(())
    }

    fn wait_event(&self, events: &mut [Event], timeout_ms: i32) -> Result<usize> {
        check_batch(events)?;
        let (mut read, mut write, mut except, snapshot, max_fd) = {
            let state = lock(&self.state);
            (
                state.read.clone(),
                state.write.clone(),
                state.except.clone(),
                state.table.entries().to_vec(),
                state.max_fd,
            )
        };
        if snapshot.is_empty() || max_fd < 0 {
            return Ok(0);
        }

        let mut timeout = select_timeout(timeout_ms);
        let num_fds = select(
            max_fd + 1,
            &mut read,
            &mut write,
            &mut except,
            timeout.as_mut(),
        )
        .map_err(Error::Backend)?;
        if num_fds == 0 {
            return Ok(0);
        }

        let mut filled = 0;
        for entry in &snapshot {
            let fd = borrow(entry.fd);
            let mut ready = Interest::NONE;
            if read.contains(fd) {
                ready |= Interest::READ;
            }
            if write.contains(fd) {
                ready |= Interest::WRITE;
            }
            if except.contains(fd) {
                ready |= Interest::ERROR;
            }
            if ready.is_empty() {
                continue;
            }

            events[filled] = Event::with_ready(entry.fd, ready);
            filled += 1;
            if filled == events.len() {
                break;
            }
        }
        trace!("select: {} ready", filled);
        Ok(filled)
    }
}
