//! Connection configuration.
//!
//! # Design
//!
//! - [`ClientConfig`] is consumed once, at [`crate::Client::connect`] time; it
//!   is not a live handle and has no effect on a connection already running.
//! - A builder is offered so future options (e.g. TLS, auth) can be wired
//!   through without breaking call sites.

use std::time::Duration;

/// Default number of seconds allowed to establish the TCP connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity, in bytes, of the connection's read buffer.
const DEFAULT_READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Configuration describing how to reach and drive a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    host: String,
    port: u16,
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
    id: Option<String>,
    read_buffer_capacity: usize,
}

impl ClientConfig {
    /// Creates a new [`ClientConfigBuilder`] targeting `host:port`.
    #[must_use]
    pub fn builder(host: impl Into<String>, port: u16) -> ClientConfigBuilder {
        ClientConfigBuilder {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            id: None,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
        }
    }

    /// The server hostname or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// How long to wait for the TCP connection to establish.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// How long a single command waits for its response, if bounded.
    ///
    /// This only bounds local waiting on the `oneshot::Receiver`; it cannot
    /// retract a request already written to the wire.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// An optional identifier, included in tracing spans for this
    /// connection so log lines from multiple connections can be told apart.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Initial capacity of the connection's read buffer, in bytes.
    #[must_use]
    pub const fn read_buffer_capacity(&self) -> usize {
        self.read_buffer_capacity
    }
}

/// Builder used to assemble a [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    host: String,
    port: u16,
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
    id: Option<String>,
    read_buffer_capacity: usize,
}

impl ClientConfigBuilder {
    /// Overrides the connect timeout (default 5 seconds).
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bounds how long a command waits for its response (default
    /// unbounded).
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Attaches an identifier used in tracing spans (default none).
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Overrides the read buffer's initial capacity (default 8 KiB).
    #[must_use]
    pub const fn read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity;
        self
    }

    /// Finalises the builder and constructs a [`ClientConfig`].
    #[must_use]
    pub fn build(self) -> ClientConfig {
        ClientConfig {
            host: self.host,
            port: self.port,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            id: self.id,
            read_buffer_capacity: self.read_buffer_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::builder("localhost", 11211).build();
        assert_eq!(config.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.id(), None);
        assert_eq!(config.read_buffer_capacity(), DEFAULT_READ_BUFFER_CAPACITY);
    }

    #[test]
    fn builder_overrides_are_applied() {
        let config = ClientConfig::builder("cache.internal", 11211)
            .connect_timeout(Duration::from_millis(250))
            .request_timeout(Duration::from_secs(1))
            .id("primary")
            .read_buffer_capacity(4096)
            .build();

        assert_eq!(config.host(), "cache.internal");
        assert_eq!(config.port(), 11211);
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(1)));
        assert_eq!(config.id(), Some("primary"));
        assert_eq!(config.read_buffer_capacity(), 4096);
    }
}
