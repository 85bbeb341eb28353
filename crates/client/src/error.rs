//! Error types for the connection actor and its command API.

use std::io;
use std::panic::Location;

use protocol::DecodeError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors a command can fail with.
///
/// Every variant but [`ClientError::Io`] carries the call-site [`Location`]
/// of the command method that raised it (captured via `#[track_caller]`),
/// so a log line or a `{:?}` dump points back at the `client.get(...)`
/// call rather than at the driver loop deep inside the actor. `Io` omits it
/// to allow a plain `#[from]` conversion, matching how this crate's teacher
/// handles its own I/O variant.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection is not running, or has terminated — includes the
    /// triggering I/O error when there was one (a failed dial, a broken
    /// pipe, a locally-abandoned request wait, or an explicit `close()`).
    #[error("connection shut down (at {location})")]
    ConnectionShutdown {
        /// The error that caused the shutdown, if any.
        #[source]
        cause: Option<io::Error>,
        /// Call-site of the command that observed the shutdown.
        location: &'static Location<'static>,
    },

    /// A wire protocol violation, or the server returned a return code the
    /// calling command did not expect for its verb.
    #[error("protocol error: {detail} (at {location})")]
    ProtocolError {
        /// Human-readable description of the violation.
        detail: String,
        /// The underlying decode failure, if the violation came from the decoder
        /// rather than from an unexpected-but-well-formed return code.
        #[source]
        source: Option<DecodeError>,
        /// Call-site of the command that observed the violation.
        location: &'static Location<'static>,
    },

    /// `delete`/`replace`/`append`/`prepend` found no such key.
    #[error("key not found (at {location})")]
    KeyNotFound {
        /// Call-site of the command that received the miss.
        location: &'static Location<'static>,
    },

    /// `add` found the key already present.
    #[error("key already exists (at {location})")]
    KeyExist {
        /// Call-site of the command that received the collision.
        location: &'static Location<'static>,
    },

    /// A raw I/O error not otherwise classified.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// The call-site location carried by every variant except
    /// [`ClientError::Io`].
    #[must_use]
    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Self::ConnectionShutdown { location, .. }
            | Self::ProtocolError { location, .. }
            | Self::KeyNotFound { location }
            | Self::KeyExist { location } => Some(location),
            Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn make_shutdown_error() -> ClientError {
        ClientError::ConnectionShutdown {
            cause: None,
            location: Location::caller(),
        }
    }

    #[test]
    fn display_includes_location() {
        let err = make_shutdown_error();
        let rendered = err.to_string();
        assert!(rendered.contains("connection shut down"));
        assert!(rendered.contains(file!()));
    }

    #[test]
    fn location_accessor_matches_display() {
        let err = make_shutdown_error();
        assert_eq!(err.location().unwrap().file(), file!());
    }

    #[test]
    fn io_variant_has_no_location() {
        let err: ClientError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(err.location().is_none());
    }

    #[test]
    fn connection_shutdown_carries_cause() {
        use std::error::Error;

        let cause = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let err = ClientError::ConnectionShutdown {
            cause: Some(cause),
            location: Location::caller(),
        };
        assert!(err.source().is_some());
    }
}
