//! # Error Types
//!
//! Custom error types for Netpad using `thiserror`.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Failures of the virtual input device layer
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The injection facility could not be opened or refused to create a device
    #[error("input injection facility unavailable: {0}")]
    Unavailable(String),

    /// Writing an event to a live device failed
    #[error("failed to submit event: {0}")]
    Submit(#[source] io::Error),

    /// The device was already destroyed
    #[error("device already destroyed")]
    Destroyed,
}

/// Main error type for Netpad
#[derive(Debug, Error)]
pub enum NetpadError {
    /// Virtual device errors
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The listening socket could not be opened
    #[error("failed to open a socket: {0}")]
    SocketOpen(#[source] io::Error),

    /// The listening socket could not be bound
    #[error("failed to bind the socket to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The bound socket could not be put into listening state
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Waiting for socket readiness failed
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NetpadError {
    /// Process exit code reported for this failure
    ///
    /// Each fatal class gets its own code so operators can tell them apart
    /// from the exit status alone. Code 0 is reserved for a signal-driven
    /// graceful shutdown.
    pub fn exit_code(&self) -> i32 {
        match self {
            NetpadError::Device(_) => 1,
            NetpadError::SocketOpen(_) => 2,
            NetpadError::Bind { .. } => 3,
            NetpadError::Listen { .. } => 4,
            NetpadError::Wait(_) => 5,
            NetpadError::Config(_) => 6,
            NetpadError::Io(_) => 1,
        }
    }
}

/// Result type alias for Netpad
pub type Result<T> = std::result::Result<T, NetpadError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "0.0.0.0:3185".parse().unwrap()
    }

    #[test]
    fn test_exit_codes_are_distinct_per_fatal_class() {
        let errors = [
            NetpadError::Device(DeviceError::Unavailable("no uinput".into())),
            NetpadError::SocketOpen(io::Error::from(io::ErrorKind::Other)),
            NetpadError::Bind { addr: addr(), source: io::Error::from(io::ErrorKind::AddrInUse) },
            NetpadError::Listen { addr: addr(), source: io::Error::from(io::ErrorKind::Other) },
            NetpadError::Wait(io::Error::from(io::ErrorKind::Other)),
        ];

        let codes: Vec<i32> = errors.iter().map(NetpadError::exit_code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_no_error_maps_to_success() {
        let err = NetpadError::Io(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_ne!(err.exit_code(), 0, "Errors must never exit with 0");
    }

    #[test]
    fn test_bind_error_message_names_address() {
        let err = NetpadError::Bind { addr: addr(), source: io::Error::from(io::ErrorKind::AddrInUse) };
        assert!(err.to_string().contains("0.0.0.0:3185"));
    }

    #[test]
    fn test_device_error_is_transparent() {
        let err: NetpadError = DeviceError::Unavailable("permission denied".into()).into();
        assert_eq!(err.to_string(), "input injection facility unavailable: permission denied");
    }
}
