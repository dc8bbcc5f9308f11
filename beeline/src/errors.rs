use std::fmt::{self, Display};

use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ErrorKind {
    Driver(conbee::Error),
    /// No matching indication arrived before the pending entry expired.
    Timeout,
    /// A waitress entry expired; carries a description of the matcher.
    WaitForTimeout(String),
    /// A ZDP response carried a non-zero status byte.
    Status(u8),
    /// An endpoint-type bind target without a destination endpoint.
    MissingDestinationEndpoint,
    Unsupported(&'static str),
    ChannelError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Driver(error) => write!(f, "{}", error),
            ErrorKind::Timeout => write!(f, "waiting for response TIMEOUT"),
            ErrorKind::WaitForTimeout(description) => write!(f, "{}", description),
            ErrorKind::Status(status) => write!(f, "status: {}", status),
            ErrorKind::MissingDestinationEndpoint => write!(f, "missing destination endpoint"),
            ErrorKind::Unsupported(operation) => write!(f, "{} is not supported", operation),
            ErrorKind::ChannelError => write!(f, "channel error"),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {}

impl From<conbee::Error> for Error {
    fn from(other: conbee::Error) -> Self {
        Error {
            kind: ErrorKind::Driver(other),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl From<oneshot::error::RecvError> for Error {
    fn from(_: oneshot::error::RecvError) -> Error {
        Error {
            kind: ErrorKind::ChannelError,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
