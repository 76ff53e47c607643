//! Crate error types
//!
//! Top-level error type shared by the server and client, plus the
//! protocol-level errors produced while parsing wire lines.

use crate::registry::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error from the underlying transport
    Io(std::io::Error),
    /// Protocol violation (malformed command or response)
    Protocol(ProtocolError),
    /// Registry rejected the operation
    Registry(RegistryError),
    /// Publish attempted without valid authorization
    Unauthorized,
    /// Server rejected the request with the given reason
    Rejected(String),
    /// Connection cannot carry a message stream
    TransportUnavailable,
    /// Peer closed the connection
    ConnectionClosed,
}

/// Error type for wire protocol parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command verb is not recognized
    UnknownCommand(String),
    /// Command is missing a required argument
    MissingArgument(&'static str),
    /// Response line does not match any known form
    UnexpectedResponse(String),
    /// Operation requires an established connection
    NotConnected,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Protocol(e) => write!(f, "protocol error: {}", e),
            Error::Registry(e) => write!(f, "registry error: {}", e),
            Error::Unauthorized => write!(f, "unauthorized"),
            Error::Rejected(reason) => write!(f, "rejected: {}", reason),
            Error::TransportUnavailable => write!(f, "transport unavailable"),
            Error::ConnectionClosed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Registry(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::UnknownCommand(verb) => write!(f, "unknown command: {}", verb),
            ProtocolError::MissingArgument(name) => write!(f, "missing argument: {}", name),
            ProtocolError::UnexpectedResponse(line) => {
                write!(f, "unexpected response: {}", line)
            }
            ProtocolError::NotConnected => write!(f, "not connected"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}
