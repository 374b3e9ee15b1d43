//! Abstraction over the kernel readiness facilities.
//!
//! Each facility has its own registration model and flag semantics. This
//! interface restricts them to a common shape so the consumer never learns
//! which one is underneath:
//!
//! 1) epoll: registration lives in the kernel. Wait cost follows the number
//!           of ready descriptors.
//! 2) poll: registration lives only in userspace. The table is resubmitted
//!          on every wait, so a wait sees the table as it was when the call
//!          started.
//! 3) select: registration is mirrored into three fd sets. Descriptors at or
//!            above `FD_SETSIZE` cannot be watched at all.
//!
//! All methods take `&self`. Implementors guard their state with a lock that
//! is never held across the blocking wait, so registration may proceed from
//! one thread while another waits.
use crate::error::Result;
use crate::event::Event;
use crate::poller::PollerKind;

pub trait AsPoller: Send + Sync {
    fn kind(&self) -> PollerKind;

    /// Number of registered descriptors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Register `event.fd`, or replace its interest if already registered.
    fn update_event(&self, event: &Event) -> Result<()>;

    fn add_event(&self, event: &Event) -> Result<()> {
        self.update_event(event)
    }

    /// Unregister `event.fd`. Unknown descriptors are not an error.
    fn remove_event(&self, event: &Event) -> Result<()>;

    /// Block for up to `timeout_ms` (negative blocks forever) and fill the
    /// front of `events` with ready descriptors. Returns how many were filled.
    fn wait_event(&self, events: &mut [Event], timeout_ms: i32) -> Result<usize>;
}
