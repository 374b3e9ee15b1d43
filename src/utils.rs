use nix::errno::Errno;
use std::os::fd::RawFd;

/// Read whatever is available on a descriptor that was just reported ready.
/// A spurious wakeup (`EAGAIN`) or an interrupted read yields `Data(0)`,
/// which is distinct from `Eof`.
pub fn read_ready(fd: RawFd, buf: &mut [u8]) -> nix::Result<ReadOutcome> {
    match nix::unistd::read(fd, buf) {
        Ok(0) => Ok(ReadOutcome::Eof),
        Ok(n) => Ok(ReadOutcome::Data(n)),
        // Readiness was already consumed elsewhere; the next wait reports it
        // again if more data arrives.
        Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(ReadOutcome::Data(0)),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(usize),
    Eof,
}
