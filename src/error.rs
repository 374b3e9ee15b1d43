use std::{error, fmt, io};

use nix::errno::Errno;

use crate::poller::PollerKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The backend or its OS resource could not be created.
    Alloc(Errno),
    InvalidArgument(&'static str),
    /// A new descriptor was registered while the table was full.
    CapacityExceeded { capacity: usize },
    /// The kernel refused a registration, modification or wait call.
    Backend(Errno),
    Unsupported(PollerKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "failed to create poller: {}", e),
            Self::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            Self::CapacityExceeded { capacity } => {
                write!(f, "interest table is full ({} entries)", capacity)
            }
            Self::Backend(e) => write!(f, "backend call failed: {}", e),
            Self::Unsupported(kind) => write!(f, "{} is not available on this target", kind),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Alloc(e) | Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Alloc(e) | Error::Backend(e) => io::Error::from(e),
            Error::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::CapacityExceeded { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err),
            Error::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, err),
        }
    }
}
