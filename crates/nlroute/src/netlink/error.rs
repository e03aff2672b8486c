//! Error types for netlink operations.

use std::io;

use crate::util::addr::AddrError;

use super::session::SessionState;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Creating the netlink socket failed.
    #[error("cannot open netlink socket: {0}")]
    Socket(#[source] io::Error),

    /// Binding the socket failed, or the kernel handed back an address
    /// that is not a netlink address.
    #[error("cannot bind netlink socket: {0}")]
    Bind(String),

    /// Writing a request to the socket failed.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// The socket accepted only part of a request.
    #[error("short send: wrote {written} of {expected} bytes")]
    ShortSend {
        /// Bytes accepted by the socket.
        written: usize,
        /// Length of the request frame.
        expected: usize,
    },

    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A received chunk did not hold whole messages.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// An attribute header is inconsistent with the bytes around it.
    #[error("malformed attribute at offset {offset}: {reason}")]
    MalformedAttribute {
        /// Offset of the bad record inside the attribute range.
        offset: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// An attribute value has the wrong shape for its type.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A frame or record size does not fit its length field.
    #[error("size overflow: {0} bytes cannot be framed")]
    Overflow(usize),

    /// Appending would run past the end of the scratch buffer.
    #[error("buffer full: need {needed} bytes, capacity {capacity}")]
    BufferFull {
        /// Logical length the write would need.
        needed: usize,
        /// Size of the buffer.
        capacity: usize,
    },

    /// A request builder could not fit an attribute into its buffer.
    #[error("attribute {attr_type} does not fit request buffer: need {needed} bytes, capacity {capacity}")]
    AttributeOverflow {
        /// The attribute being appended.
        attr_type: u16,
        /// Logical length the write would need.
        needed: usize,
        /// Size of the buffer.
        capacity: usize,
    },

    /// Address string could not be parsed.
    #[error(transparent)]
    Address(#[from] AddrError),

    /// No interface index was given and none could be picked.
    #[error("no default interface: {0}")]
    NoDefaultInterface(String),

    /// Operation attempted in the wrong session state.
    #[error("session is {actual:?}, expected {expected:?}")]
    InvalidState {
        /// State the operation needs.
        expected: SessionState,
        /// State the session is in.
        actual: SessionState,
    },

    /// Strict route dump saw a message for another family or table.
    #[error("route for family {family} table {table} does not match request")]
    UnexpectedRoute {
        /// Family of the offending message.
        family: u8,
        /// Table of the offending message.
        table: u32,
    },
}

impl Error {
    /// Create a kernel error from an errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV)
            }
            Self::NoDefaultInterface(_) => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::EPERM | libc::EACCES)
            }
            _ => false,
        }
    }

    /// Check if this is a "already exists" error (EEXIST).
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                *errno == libc::EEXIST
            }
            _ => false,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-1); // EPERM
        assert!(err.is_permission_denied());
        assert_eq!(err.errno(), Some(1));
    }

    #[test]
    fn test_with_context_keeps_errno() {
        let err = Error::from_errno(-2).with_context("adding 10.0.0.1 on eth0"); // ENOENT
        assert!(err.is_not_found());
        let msg = err.to_string();
        assert!(msg.contains("adding 10.0.0.1 on eth0"));
        assert!(msg.contains("No such file or directory"));
    }

    #[test]
    fn test_with_context() {
        let err = Error::from_errno(-17).with_context("adding address");
        assert!(err.is_already_exists());
        assert!(err.to_string().starts_with("adding address:"));
    }

    #[test]
    fn test_error_messages() {
        let err = Error::ShortSend {
            written: 10,
            expected: 28,
        };
        assert_eq!(err.to_string(), "short send: wrote 10 of 28 bytes");

        let err = Error::InvalidState {
            expected: SessionState::Idle,
            actual: SessionState::Closed,
        };
        assert_eq!(err.to_string(), "session is Closed, expected Idle");
    }
}
