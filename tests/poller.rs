use nix::{errno::Errno, unistd::pipe};
use pollmux::{Error, Event, Interest, Poller, PollerKind};
use std::{
    fs::File,
    io::Write,
    os::fd::{AsRawFd, OwnedFd},
    thread,
    time::{Duration, Instant},
};

fn kinds() -> Vec<PollerKind> {
    let mut kinds = vec![PollerKind::Poll, PollerKind::Select];
    if cfg!(any(target_os = "linux", target_os = "android")) {
        kinds.insert(0, PollerKind::Epoll);
    }
    kinds
}

/// Returns the read end and the write end (as a `File` for convenience).
fn pipe_pair() -> (OwnedFd, File) {
    let (r, w) = pipe().expect("pipe");
    (r, File::from(w))
}

fn readable_pipe() -> (OwnedFd, File) {
    let (r, mut w) = pipe_pair();
    w.write_all(b"ping").unwrap();
    (r, w)
}

#[test]
fn every_backend_reports_a_readable_pipe() {
    for kind in kinds() {
        let poller = Poller::new(kind, 4).unwrap();
        let (r, _w) = readable_pipe();
        let fd = r.as_raw_fd();

        poller.add_event(&Event::new(fd, Interest::ERROR)).unwrap();
        poller.update_event(&Event::new(fd, Interest::READ)).unwrap();

        let mut events = [Event::default(); 4];
        let n = poller.wait_event(&mut events, 1000).unwrap();
        assert_eq!(n, 1, "{}", kind);
        assert_eq!(events[0].fd, fd, "{}", kind);
        assert_eq!(events[0].ready, Interest::READ, "{}", kind);

        poller.remove_event(&Event::new(fd, Interest::READ)).unwrap();
        assert!(poller.is_empty(), "{}", kind);
    }
}

#[test]
fn write_only_readiness_leaves_read_unset() {
    for kind in kinds() {
        let poller = Poller::new(kind, 4).unwrap();
        let (_r, w) = pipe_pair();
        let fd = w.as_raw_fd();
        poller
            .add_event(&Event::new(fd, Interest::READ | Interest::WRITE))
            .unwrap();

        let mut events = [Event::default(); 4];
        let n = poller.wait_event(&mut events, 1000).unwrap();
        assert_eq!(n, 1, "{}", kind);
        assert_eq!(events[0].ready, Interest::WRITE, "{}", kind);
    }
}

#[test]
fn empty_table_does_not_block() {
    for kind in kinds() {
        let poller = Poller::new(kind, 4).unwrap();
        let mut events = [Event::default(); 4];

        let start = Instant::now();
        assert_eq!(poller.wait_event(&mut events, 2000).unwrap(), 0);
        assert!(start.elapsed() < Duration::from_millis(500), "{}", kind);
    }
}

#[test]
fn full_table_rejects_new_descriptors() {
    for kind in kinds() {
        let poller = Poller::new(kind, 1).unwrap();
        let (r, w) = pipe_pair();

        poller.add_event(&Event::new(r.as_raw_fd(), Interest::READ)).unwrap();
        let err = poller.add_event(&Event::new(w.as_raw_fd(), Interest::WRITE));
        assert_eq!(err, Err(Error::CapacityExceeded { capacity: 1 }), "{}", kind);
        assert_eq!(poller.len(), 1, "{}", kind);

        // Updating the descriptor already present still works.
        poller
            .update_event(&Event::new(r.as_raw_fd(), Interest::ERROR))
            .unwrap();
        assert_eq!(poller.len(), 1, "{}", kind);
    }
}

#[test]
fn repeated_update_keeps_one_entry_with_last_mask() {
    for kind in kinds() {
        let poller = Poller::new(kind, 4).unwrap();
        let (r, _w) = readable_pipe();
        let fd = r.as_raw_fd();
        let mut events = [Event::default(); 4];

        poller.update_event(&Event::new(fd, Interest::READ)).unwrap();
        poller.update_event(&Event::new(fd, Interest::WRITE)).unwrap();
        assert_eq!(poller.len(), 1, "{}", kind);
        // A read end never becomes writable, so the READ interest is gone.
        assert_eq!(poller.wait_event(&mut events, 0).unwrap(), 0, "{}", kind);

        poller.update_event(&Event::new(fd, Interest::READ)).unwrap();
        poller.update_event(&Event::new(fd, Interest::READ)).unwrap();
        assert_eq!(poller.len(), 1, "{}", kind);
        assert_eq!(poller.wait_event(&mut events, 0).unwrap(), 1, "{}", kind);
    }
}

#[test]
fn removing_an_unknown_descriptor_succeeds() {
    for kind in kinds() {
        let poller = Poller::new(kind, 4).unwrap();
        let (r, _w) = pipe_pair();
        poller.add_event(&Event::new(r.as_raw_fd(), Interest::READ)).unwrap();

        assert!(poller.remove_event(&Event::new(999, Interest::READ)).is_ok());
        assert_eq!(poller.len(), 1, "{}", kind);
    }
}

#[test]
fn removed_descriptor_is_not_reported() {
    for kind in kinds() {
        let poller = Poller::new(kind, 4).unwrap();
        let (quiet, _qw) = pipe_pair();
        let (loud, _lw) = readable_pipe();
        poller.add_event(&Event::new(quiet.as_raw_fd(), Interest::READ)).unwrap();
        poller.add_event(&Event::new(loud.as_raw_fd(), Interest::READ)).unwrap();
        poller.remove_event(&Event::new(loud.as_raw_fd(), Interest::READ)).unwrap();

        let mut events = [Event::default(); 4];
        assert_eq!(poller.wait_event(&mut events, 0).unwrap(), 0, "{}", kind);
    }
}

#[test]
fn hangup_is_reported_as_readable() {
    // select only reports hang-up through the read set, which an
    // ERROR-only registration does not include.
    for kind in kinds().into_iter().filter(|k| *k != PollerKind::Select) {
        let poller = Poller::new(kind, 4).unwrap();
        let (r, w) = pipe_pair();
        poller.add_event(&Event::new(r.as_raw_fd(), Interest::ERROR)).unwrap();
        drop(w);

        let mut events = [Event::default(); 4];
        let n = poller.wait_event(&mut events, 1000).unwrap();
        assert_eq!(n, 1, "{}", kind);
        assert!(events[0].is_readable(), "{}", kind);
        assert!(!events[0].is_error(), "{}", kind);
    }
}

#[test]
fn batch_size_bounds_the_result() {
    for kind in kinds() {
        let poller = Poller::new(kind, 8).unwrap();
        let pipes: Vec<_> = (0..3).map(|_| readable_pipe()).collect();
        for (r, _) in &pipes {
            poller.add_event(&Event::new(r.as_raw_fd(), Interest::READ)).unwrap();
        }

        let mut events = [Event::default(); 2];
        let n = poller.wait_event(&mut events, 1000).unwrap();
        assert_eq!(n, 2, "{}", kind);
        assert!(events.iter().all(|e| e.is_readable()), "{}", kind);
    }
}

#[test]
fn registration_proceeds_during_a_wait() {
    for kind in kinds() {
        let poller = Poller::new(kind, 4).unwrap();
        let (idle, mut idle_w) = pipe_pair();
        let (other, _other_w) = pipe_pair();
        poller.add_event(&Event::new(idle.as_raw_fd(), Interest::READ)).unwrap();

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                let mut events = [Event::default(); 4];
                poller.wait_event(&mut events, 5000)
            });

            thread::sleep(Duration::from_millis(50));
            let start = Instant::now();
            poller.add_event(&Event::new(other.as_raw_fd(), Interest::READ)).unwrap();
            poller.remove_event(&Event::new(other.as_raw_fd(), Interest::READ)).unwrap();
            assert!(start.elapsed() < Duration::from_millis(1000), "{}", kind);

            idle_w.write_all(b"wake").unwrap();
            let n = waiter.join().unwrap().unwrap();
            assert!(n >= 1, "{}", kind);
        });
    }
}

#[test]
fn failed_select_wait_leaves_table_untouched() {
    let poller = Poller::new(PollerKind::Select, 4).unwrap();
    let (r, _w) = pipe_pair();
    poller.add_event(&Event::new(r.as_raw_fd(), Interest::READ)).unwrap();
    drop(r);

    let mut events = [Event::default(); 4];
    assert_eq!(
        poller.wait_event(&mut events, 0),
        Err(Error::Backend(Errno::EBADF))
    );
    assert_eq!(poller.len(), 1);
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn epoll_remove_after_close_keeps_the_entry() {
    let poller = Poller::new(PollerKind::Epoll, 4).unwrap();
    let (r, _w) = pipe_pair();
    let fd = r.as_raw_fd();
    poller.add_event(&Event::new(fd, Interest::READ)).unwrap();
    drop(r);

    assert_eq!(
        poller.remove_event(&Event::new(fd, Interest::READ)),
        Err(Error::Backend(Errno::EBADF))
    );
    assert_eq!(poller.len(), 1);
}
