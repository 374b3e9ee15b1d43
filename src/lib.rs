//! Readiness multiplexing over epoll, poll and select behind one interface.
//!
//! ```no_run
//! use pollmux::{Event, Interest, Poller, PollerKind};
//!
//! let poller = Poller::new(PollerKind::Epoll, 16)?;
//! poller.add_event(&Event::new(0, Interest::READ))?;
//!
//! let mut events = [Event::default(); 8];
//! let n = poller.wait_event(&mut events, 1000)?;
//! for ev in &events[..n] {
//!     println!("fd {} is {}", ev.fd, ev.ready);
//! }
//! # Ok::<(), pollmux::Error>(())
//! ```
pub mod error;
pub mod event;
pub mod poller;

pub use error::{Error, Result};
pub use event::{Event, Interest};
pub use poller::{AsPoller, Poller, PollerKind};
