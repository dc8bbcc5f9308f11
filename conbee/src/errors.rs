use std::fmt::{self, Display};

use crate::ParameterId;

#[derive(Debug)]
pub enum ErrorKind {
    UnsupportedParameter(u8),
    InvalidParameter {
        parameter_id: ParameterId,
        inner: Box<Error>,
    },
    UnexpectedParameter(ParameterId),
    InvalidMacAddr(String),
    /// Failure reported by the byte-level driver implementation.
    Driver(String),
    Io(std::io::Error),
    ChannelError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnsupportedParameter(parameter_id) => {
                write!(f, "unsupported parameter ID: {}", parameter_id)
            }
            ErrorKind::InvalidParameter {
                parameter_id,
                inner,
            } => write!(f, "invalid parameter for ID {}: {}", parameter_id, inner),
            ErrorKind::UnexpectedParameter(parameter_id) => {
                write!(f, "unexpected parameter in response: {}", parameter_id)
            }
            ErrorKind::InvalidMacAddr(s) => write!(f, "invalid MAC address: {}", s),
            ErrorKind::Driver(message) => write!(f, "driver: {}", message),
            ErrorKind::Io(error) => write!(f, "IO error: {}", error),
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
        write!(f, "conbee error: {}", self.kind)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(other: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(other),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
