//! Test-only [`Dial`] fixture backed by an in-process duplex pair, so the
//! driver loop can be exercised against a fake server without a real
//! socket.

use std::io;
use std::sync::Mutex;

use tokio::io::DuplexStream;

use crate::dial::Dial;

/// A [`Dial`] impl that hands out one pre-built [`DuplexStream`] half and
/// then fails every subsequent call.
///
/// Build a pair with [`duplex_dialer`], spawn [`Connection::run`](crate::Connection::run)
/// against the [`Client`](crate::Client) paired with the returned dialer, and
/// drive the other [`DuplexStream`] half directly as a fake server.
pub struct DuplexDialer {
    stream: Mutex<Option<DuplexStream>>,
}

impl Dial for DuplexDialer {
    type Stream = DuplexStream;

    async fn dial(&self, _host: &str, _port: u16) -> io::Result<DuplexStream> {
        self.stream
            .lock()
            .expect("duplex dialer mutex poisoned")
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "duplex stream already consumed"))
    }
}

/// Creates a [`DuplexDialer`] plus the server-side half of the pair it will
/// hand to the driver loop on the first (and only) call to `dial`.
pub fn duplex_dialer(buffer_capacity: usize) -> (DuplexDialer, DuplexStream) {
    let (client_side, server_side) = tokio::io::duplex(buffer_capacity);
    (
        DuplexDialer {
            stream: Mutex::new(Some(client_side)),
        },
        server_side,
    )
}
