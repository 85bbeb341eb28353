//! Abstraction over establishing the byte stream a connection runs on.
//!
//! Production code dials a real [`TcpStream`]; tests substitute an
//! in-process [`tokio::io::DuplexStream`] pair via a fake [`Dial`]
//! implementation so the driver loop can be exercised without a live
//! server. See `crate::testing` for the fixture that hands the driver one
//! half of a duplex pair and keeps the other half for the test to act as
//! the server.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Establishes the transport a connection will run its protocol over.
pub trait Dial: Send + Sync + 'static {
    /// The concrete byte stream type this dialer produces.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connects to `host:port`.
    async fn dial(&self, host: &str, port: u16) -> io::Result<Self::Stream>;
}

/// The production [`Dial`] implementation: a plain TCP connection.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpDialer;

impl Dial for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        TcpStream::connect((host, port)).await
    }
}
