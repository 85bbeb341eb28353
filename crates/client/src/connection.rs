//! The connection actor: owns the socket, serializes concurrently
//! submitted requests onto it, and correlates responses back to callers.
//!
//! # Design
//!
//! [`Connection`] and [`Client`] are a split handle: [`Connection::run`]
//! is the driver loop and is meant to be `.await`ed (or spawned) by the
//! caller on whatever runtime they're already using; [`Client`] is the
//! cheaply-`Clone`able handle application tasks use to submit commands. The
//! two communicate over a `tokio::sync::mpsc::unbounded_channel` of
//! `(Request, oneshot::Sender<Result<Response, ClientError>>)` pairs, so the
//! driver is the *only* task that ever touches the socket.

use std::future::Future;
use std::panic::Location;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use protocol::{ArithmeticMode, Codec, Flags, Request, Response, ReturnCode, StorageMode, Value};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::dial::{Dial, TcpDialer};
use crate::error::ClientError;
use crate::ttl::TimeToLive;

type Submission = (Request, oneshot::Sender<Result<Response, ClientError>>);

/// The connection's lifecycle state, as described in the data model: a
/// connection starts `Initial`, becomes `Running` once the socket handshake
/// completes, and `Finished` is absorbing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    /// Not yet connected; no I/O has happened.
    Initial,
    /// Connected and serving requests.
    Running,
    /// Terminated; all submissions fail with
    /// [`ClientError::ConnectionShutdown`].
    Finished,
}

impl ConnectionState {
    fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Initial,
            1 => Self::Running,
            _ => Self::Finished,
        }
    }
}

#[derive(Debug)]
struct SharedState {
    code: AtomicU8,
    closed: watch::Sender<bool>,
}

/// The driver: owns the socket and the single in-flight reply slot.
///
/// Created alongside a [`Client`] by [`Connection::connect`]; `run` consumes
/// `self`; there is no way to call it twice, which is what enforces
/// `Initial → Running` happening at most once at the type level.
pub struct Connection<D: Dial = TcpDialer, C: Clock = SystemClock> {
    config: ClientConfig,
    dialer: D,
    clock: Arc<C>,
    receiver: mpsc::UnboundedReceiver<Submission>,
    closed_rx: watch::Receiver<bool>,
    shared: Arc<SharedState>,
}

/// The caller-facing handle: submits commands to the driver loop.
///
/// Cheap to clone; every clone shares the same underlying connection.
#[derive(Clone)]
pub struct Client {
    sender: mpsc::UnboundedSender<Submission>,
    request_timeout: Option<Duration>,
    clock: Arc<dyn Clock>,
    shared: Arc<SharedState>,
}

impl Connection<TcpDialer, SystemClock> {
    /// Creates a connection/client pair targeting `config`'s host and port,
    /// dialing a real TCP socket and using the real system clock.
    ///
    /// Does no I/O; the connection starts in [`ConnectionState::Initial`].
    #[must_use]
    pub fn connect(config: ClientConfig) -> (Self, Client) {
        Self::connect_with(config, TcpDialer, SystemClock)
    }
}

impl<D: Dial, C: Clock> Connection<D, C> {
    /// Creates a connection/client pair using an injected dialer and clock,
    /// for tests that substitute a fake transport or a fake clock.
    #[must_use]
    pub fn connect_with(config: ClientConfig, dialer: D, clock: C) -> (Self, Client) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);
        let shared = Arc::new(SharedState {
            code: AtomicU8::new(ConnectionState::Initial as u8),
            closed: closed_tx,
        });
        let clock = Arc::new(clock);
        let connection = Self {
            config,
            dialer,
            clock: Arc::clone(&clock),
            receiver,
            closed_rx,
            shared: Arc::clone(&shared),
        };
        let client = Client {
            sender,
            request_timeout: connection.config.request_timeout(),
            clock,
            shared,
        };
        (connection, client)
    }

    /// Connects and serves requests until the client side is dropped, the
    /// peer closes cleanly between requests, or a fatal I/O/protocol error
    /// occurs. Any of these transitions the state to
    /// [`ConnectionState::Finished`].
    pub async fn run(mut self) -> Result<(), ClientError> {
        let host = self.config.host().to_owned();
        let port = self.config.port();
        let id = self.config.id().map(str::to_owned);

        let stream = timeout(
            self.config.connect_timeout(),
            self.dialer.dial(&host, port),
        )
        .await
        .map_err(|_| ClientError::ConnectionShutdown {
            cause: Some(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out",
            )),
            location: Location::caller(),
        })?
        .map_err(|source| ClientError::ConnectionShutdown {
            cause: Some(source),
            location: Location::caller(),
        })?;

        self.shared
            .code
            .store(ConnectionState::Running as u8, Ordering::SeqCst);
        info!(id = id.as_deref(), %host, port, "connection established");

        let mut framed =
            Framed::with_capacity(stream, Codec::new(), self.config.read_buffer_capacity());
        let result = self.serve(&mut framed).await;

        self.shared
            .code
            .store(ConnectionState::Finished as u8, Ordering::SeqCst);
        let _ = self.shared.closed.send(true);

        match &result {
            Ok(()) => info!(id = id.as_deref(), %host, port, "connection closed cleanly"),
            Err(error) => warn!(id = id.as_deref(), %host, port, %error, "connection terminated"),
        }

        result
    }

    async fn serve<S>(&mut self, framed: &mut Framed<S, Codec>) -> Result<(), ClientError>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        loop {
            let (request, reply) = tokio::select! {
                biased;

                _ = self.closed_rx.changed() => {
                    if *self.closed_rx.borrow() {
                        return Ok(());
                    }
                    continue;
                }
                submission = self.receiver.recv() => match submission {
                    Some(submission) => submission,
                    None => return Ok(()),
                },
            };

            if let Err(source) = framed.send(request).await {
                let error = ClientError::ConnectionShutdown {
                    cause: Some(source),
                    location: Location::caller(),
                };
                let _ = reply.send(Err(clone_for_reply(&error)));
                return Err(error);
            }

            match framed.next().await {
                Some(Ok(response)) => {
                    let _ = reply.send(Ok(response));
                }
                Some(Err(source)) => {
                    let error = ClientError::ProtocolError {
                        detail: source.to_string(),
                        source: Some(source),
                        location: Location::caller(),
                    };
                    let _ = reply.send(Err(clone_for_reply(&error)));
                    return Err(error);
                }
                None => {
                    let error = ClientError::ConnectionShutdown {
                        cause: Some(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "peer closed the connection while a request was in flight",
                        )),
                        location: Location::caller(),
                    };
                    let _ = reply.send(Err(clone_for_reply(&error)));
                    return Err(error);
                }
            }
        }
    }
}

/// `ClientError` doesn't implement `Clone` (its `io::Error`/`DecodeError`
/// sources don't); when both the in-flight reply and the caller of `run`
/// need to observe the same fatal error, re-derive an equivalent one from
/// its `Display` form rather than bolting `Clone` onto every source error.
fn clone_for_reply(error: &ClientError) -> ClientError {
    let location = error
        .location()
        .expect("clone_for_reply is only called on variants that carry a location");
    match error {
        ClientError::ProtocolError { detail, .. } => ClientError::ProtocolError {
            detail: detail.clone(),
            source: None,
            location,
        },
        _ => ClientError::ConnectionShutdown {
            cause: Some(std::io::Error::other(error.to_string())),
            location,
        },
    }
}

impl Client {
    /// The connection's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_code(self.shared.code.load(Ordering::SeqCst))
    }

    /// Transitions the connection to [`ConnectionState::Finished`],
    /// dropping the sender half of the command channel so the driver loop's
    /// next `recv` returns `None` and `run` returns `Ok(())`.
    pub fn close(&self) {
        self.shared
            .code
            .store(ConnectionState::Finished as u8, Ordering::SeqCst);
        let _ = self.shared.closed.send(true);
    }

    /// Resolves once the connection has terminated, whether due to
    /// [`Client::close`], a fatal error, or a clean peer shutdown.
    pub async fn closed(&self) {
        let mut rx = self.shared.closed.subscribe();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    fn check_open(&self, location: &'static Location<'static>) -> Result<(), ClientError> {
        if self.state() == ConnectionState::Finished {
            return Err(ClientError::ConnectionShutdown {
                cause: None,
                location,
            });
        }
        Ok(())
    }

    /// Submits `request` and awaits its response.
    ///
    /// Not `#[track_caller]` itself — `#[track_caller]` cannot be placed on
    /// an `async fn` on stable Rust, so every public command captures its
    /// own call-site `Location` synchronously (see [`Client::get`] for the
    /// pattern) and threads it through to this and the other private
    /// helpers explicitly.
    async fn submit(
        &self,
        request: Request,
        location: &'static Location<'static>,
    ) -> Result<Response, ClientError> {
        self.check_open(location)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        if self.sender.send((request, reply_tx)).is_err() {
            self.shared
                .code
                .store(ConnectionState::Finished as u8, Ordering::SeqCst);
            return Err(ClientError::ConnectionShutdown {
                cause: None,
                location,
            });
        }

        let result = match self.request_timeout {
            Some(duration) => match timeout(duration, reply_rx).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(ClientError::ConnectionShutdown {
                        cause: Some(std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            "request timed out locally",
                        )),
                        location,
                    })
                }
            },
            None => reply_rx.await,
        };

        result.unwrap_or(Err(ClientError::ConnectionShutdown {
            cause: None,
            location,
        }))
    }

    /// `mg <key> v` — fetches a value.
    ///
    /// Returns `Ok(None)` only when the server replied `VA` but the payload
    /// could not be parsed into `V`; a miss (`EN`) or any other unexpected
    /// return code is a [`ClientError::ProtocolError`], not `Ok(None)`.
    #[track_caller]
    pub fn get<V: Value>(
        &self,
        key: &[u8],
    ) -> impl Future<Output = Result<Option<V>, ClientError>> + '_ {
        let location = Location::caller();
        let flags = Flags {
            return_value: true,
            ..Flags::default()
        };
        let key = key.to_vec();
        async move { self.get_inner(&key, flags, location).await }
    }

    /// `mg <key> v T<new_ttl>` — fetches a value and resets its TTL
    /// ("fetch-and-touch").
    #[track_caller]
    pub fn get_and_touch<V: Value>(
        &self,
        key: &[u8],
        new_ttl: TimeToLive,
    ) -> impl Future<Output = Result<Option<V>, ClientError>> + '_ {
        let location = Location::caller();
        let key = key.to_vec();
        async move {
            let flags = Flags {
                return_value: true,
                set_ttl: Some(new_ttl.to_wire_value(self.clock.as_ref())),
                ..Flags::default()
            };
            self.get_inner(&key, flags, location).await
        }
    }

    /// `mg <key> v t` — fetches a value along with its remaining TTL.
    #[track_caller]
    pub fn get_with_ttl<V: Value>(
        &self,
        key: &[u8],
    ) -> impl Future<Output = Result<Option<(V, TimeToLive)>, ClientError>> + '_ {
        let location = Location::caller();
        let key = key.to_vec();
        async move {
            let response = self
                .submit(
                    Request::Get {
                        key: key.clone(),
                        flags: Flags {
                            return_value: true,
                            return_ttl: true,
                            ..Flags::default()
                        },
                    },
                    location,
                )
                .await?;
            debug!(key = %String::from_utf8_lossy(&key), code = ?response.return_code, "get_with_ttl");

            match response.return_code {
                ReturnCode::VA => {
                    let ttl = TimeToLive::from_ttl_remaining(
                        response.flags.ttl_remaining,
                        self.clock.as_ref(),
                    );
                    let value = response.value.as_deref().unwrap_or(&[]);
                    Ok(V::read_from_buffer(value).map(|v| (v, ttl)))
                }
                other => Err(unexpected_return_code(other, "get_with_ttl", location)),
            }
        }
    }

    async fn get_inner<V: Value>(
        &self,
        key: &[u8],
        flags: Flags,
        location: &'static Location<'static>,
    ) -> Result<Option<V>, ClientError> {
        let response = self
            .submit(
                Request::Get {
                    key: key.to_vec(),
                    flags,
                },
                location,
            )
            .await?;
        debug!(key = %String::from_utf8_lossy(key), code = ?response.return_code, "get");

        match response.return_code {
            ReturnCode::VA => {
                let value = response.value.as_deref().unwrap_or(&[]);
                Ok(V::read_from_buffer(value))
            }
            other => Err(unexpected_return_code(other, "get", location)),
        }
    }

    /// `mg <key> T<new_ttl>` — resets a key's TTL without fetching its value.
    #[track_caller]
    pub fn touch(
        &self,
        key: &[u8],
        new_ttl: TimeToLive,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let location = Location::caller();
        let key = key.to_vec();
        async move {
            let flags = Flags {
                set_ttl: Some(new_ttl.to_wire_value(self.clock.as_ref())),
                ..Flags::default()
            };
            let response = self
                .submit(
                    Request::Get {
                        key: key.clone(),
                        flags,
                    },
                    location,
                )
                .await?;
            debug!(key = %String::from_utf8_lossy(&key), code = ?response.return_code, "touch");
            expect_hd_or_not_found(response.return_code, location)
        }
    }

    /// `ms <key> <len> T<ttl>` — unconditional store.
    #[track_caller]
    pub fn set<V: Value>(
        &self,
        key: &[u8],
        value: &V,
        ttl: TimeToLive,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let location = Location::caller();
        self.store(key, value, ttl, None, location)
    }

    /// `ms <key> <len> ME T<ttl>` — store only if the key does not exist.
    #[track_caller]
    pub fn add<V: Value>(
        &self,
        key: &[u8],
        value: &V,
        ttl: TimeToLive,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let location = Location::caller();
        self.store(key, value, ttl, Some(StorageMode::Add), location)
    }

    /// `ms <key> <len> MR T<ttl>` — store only if the key already exists.
    #[track_caller]
    pub fn replace<V: Value>(
        &self,
        key: &[u8],
        value: &V,
        ttl: TimeToLive,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let location = Location::caller();
        self.store(key, value, ttl, Some(StorageMode::Replace), location)
    }

    /// `ms <key> <len> MA` — append to the existing value.
    #[track_caller]
    pub fn append<V: Value>(
        &self,
        key: &[u8],
        value: &V,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let location = Location::caller();
        self.store(
            key,
            value,
            TimeToLive::Indefinitely,
            Some(StorageMode::Append),
            location,
        )
    }

    /// `ms <key> <len> MP` — prepend to the existing value.
    #[track_caller]
    pub fn prepend<V: Value>(
        &self,
        key: &[u8],
        value: &V,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let location = Location::caller();
        self.store(
            key,
            value,
            TimeToLive::Indefinitely,
            Some(StorageMode::Prepend),
            location,
        )
    }

    fn store<V: Value>(
        &self,
        key: &[u8],
        value: &V,
        ttl: TimeToLive,
        storage_mode: Option<StorageMode>,
        location: &'static Location<'static>,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let key = key.to_vec();
        let mut payload = bytes::BytesMut::new();
        value.write_to_buffer(&mut payload);
        async move {
            let flags = Flags {
                set_ttl: Some(ttl.to_wire_value(self.clock.as_ref())),
                storage_mode,
                ..Flags::default()
            };
            let response = self
                .submit(
                    Request::Set {
                        key: key.clone(),
                        value: payload.to_vec(),
                        flags,
                    },
                    location,
                )
                .await?;
            debug!(key = %String::from_utf8_lossy(&key), code = ?response.return_code, "store");

            match (response.return_code, storage_mode) {
                (ReturnCode::HD, _) => Ok(()),
                (ReturnCode::NS, Some(StorageMode::Add)) => {
                    Err(ClientError::KeyExist { location })
                }
                (
                    ReturnCode::NS,
                    Some(StorageMode::Replace | StorageMode::Append | StorageMode::Prepend),
                ) => Err(ClientError::KeyNotFound { location }),
                (other, _) => Err(unexpected_return_code(other, "store", location)),
            }
        }
    }

    /// `md <key>` — deletes a key.
    #[track_caller]
    pub fn delete(&self, key: &[u8]) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let location = Location::caller();
        let key = key.to_vec();
        async move {
            let response = self
                .submit(Request::Delete { key: key.clone() }, location)
                .await?;
            debug!(key = %String::from_utf8_lossy(&key), code = ?response.return_code, "delete");
            expect_hd_or_not_found(response.return_code, location)
        }
    }

    /// `ma <key> M+ D<amount>` — atomically increments a numeric value.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is zero.
    #[track_caller]
    pub fn increment(
        &self,
        key: &[u8],
        amount: u64,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        assert!(amount > 0, "increment amount must be greater than zero");
        let location = Location::caller();
        self.arithmetic(key, ArithmeticMode::Increment(amount), location)
    }

    /// `ma <key> M- D<amount>` — atomically decrements a numeric value.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is zero.
    #[track_caller]
    pub fn decrement(
        &self,
        key: &[u8],
        amount: u64,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        assert!(amount > 0, "decrement amount must be greater than zero");
        let location = Location::caller();
        self.arithmetic(key, ArithmeticMode::Decrement(amount), location)
    }

    fn arithmetic(
        &self,
        key: &[u8],
        mode: ArithmeticMode,
        location: &'static Location<'static>,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let key = key.to_vec();
        async move {
            let response = self
                .submit(
                    Request::Arithmetic {
                        key: key.clone(),
                        flags: Flags {
                            arithmetic_mode: Some(mode),
                            ..Flags::default()
                        },
                    },
                    location,
                )
                .await?;
            debug!(key = %String::from_utf8_lossy(&key), code = ?response.return_code, "arithmetic");
            expect_hd_or_not_found(response.return_code, location)
        }
    }
}

fn expect_hd_or_not_found(
    code: ReturnCode,
    location: &'static Location<'static>,
) -> Result<(), ClientError> {
    match code {
        ReturnCode::HD => Ok(()),
        ReturnCode::NF => Err(ClientError::KeyNotFound { location }),
        other => Err(unexpected_return_code(other, "command", location)),
    }
}

fn unexpected_return_code(
    code: ReturnCode,
    verb: &str,
    location: &'static Location<'static>,
) -> ClientError {
    ClientError::ProtocolError {
        detail: format!("unexpected return code {} for {verb}", return_code_name(code)),
        source: None,
        location,
    }
}

fn return_code_name(code: ReturnCode) -> &'static str {
    match code {
        ReturnCode::HD => "HD",
        ReturnCode::NS => "NS",
        ReturnCode::EX => "EX",
        ReturnCode::NF => "NF",
        ReturnCode::VA => "VA",
        ReturnCode::EN => "EN",
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

    use crate::clock::ManualClock;
    use crate::config::ClientConfig;
    use crate::testing::duplex_dialer;

    use super::*;

    async fn read_request_line<S: tokio::io::AsyncRead + Unpin>(server: &mut BufReader<S>) -> String {
        let mut line = String::new();
        server
            .read_line(&mut line)
            .await
            .expect("reading request line from fake server");
        line
    }

    async fn read_payload<S: tokio::io::AsyncRead + Unpin>(
        server: &mut BufReader<S>,
        len: usize,
    ) -> Vec<u8> {
        let mut buf = vec![0u8; len + 2]; // payload plus trailing CRLF
        server
            .read_exact(&mut buf)
            .await
            .expect("reading payload from fake server");
        buf.truncate(len);
        buf
    }

    fn harness() -> (Connection<crate::testing::DuplexDialer, ManualClock>, Client, tokio::io::DuplexStream) {
        logging::install(logging::Verbosity::new(2));
        let (dialer, server) = duplex_dialer(8 * 1024);
        let config = ClientConfig::builder("unused", 0).build();
        let (connection, client) = Connection::connect_with(config, dialer, ManualClock::new());
        (connection, client, server)
    }

    #[tokio::test]
    async fn set_then_get_round_trips_a_value() {
        let (connection, client, server) = harness();
        let driver = tokio::spawn(connection.run());
        let mut server = BufReader::new(server);

        let set_fut = client.set(b"foo", &b"hello".to_vec(), TimeToLive::Indefinitely);
        tokio::pin!(set_fut);
        tokio::select! {
            result = &mut set_fut => panic!("set resolved before the fake server replied: {result:?}"),
            line = read_request_line(&mut server) => {
                assert_eq!(line, "ms foo 5 T0\r\n");
                let payload = read_payload(&mut server, 5).await;
                assert_eq!(payload, b"hello");
                server.write_all(b"HD\r\n").await.unwrap();
            }
        }
        set_fut.await.expect("set should succeed");

        let get_fut = client.get::<Vec<u8>>(b"foo");
        tokio::pin!(get_fut);
        tokio::select! {
            result = &mut get_fut => panic!("get resolved before the fake server replied: {result:?}"),
            line = read_request_line(&mut server) => {
                assert_eq!(line, "mg foo v\r\n");
                server.write_all(b"VA 5\r\nhello\r\n").await.unwrap();
            }
        }
        let value = get_fut.await.expect("get should succeed");
        assert_eq!(value, Some(b"hello".to_vec()));

        client.close();
        driver.await.expect("driver task should not panic").ok();
    }

    #[tokio::test]
    async fn get_miss_is_a_protocol_error_not_ok_none() {
        let (connection, client, server) = harness();
        let driver = tokio::spawn(connection.run());
        let mut server = BufReader::new(server);

        let get_fut = client.get::<Vec<u8>>(b"missing");
        tokio::pin!(get_fut);
        tokio::select! {
            result = &mut get_fut => panic!("get resolved before the fake server replied: {result:?}"),
            line = read_request_line(&mut server) => {
                assert_eq!(line, "mg missing v\r\n");
                server.write_all(b"EN\r\n").await.unwrap();
            }
        }
        let error = get_fut.await.expect_err("a miss is a protocol error, not Ok(None)");
        assert!(matches!(error, ClientError::ProtocolError { .. }));

        client.close();
        driver.await.expect("driver task should not panic").ok();
    }

    #[tokio::test]
    async fn delete_of_an_absent_key_is_key_not_found() {
        let (connection, client, server) = harness();
        let driver = tokio::spawn(connection.run());
        let mut server = BufReader::new(server);

        let delete_fut = client.delete(b"ghost");
        tokio::pin!(delete_fut);
        tokio::select! {
            result = &mut delete_fut => panic!("delete resolved before the fake server replied: {result:?}"),
            line = read_request_line(&mut server) => {
                assert_eq!(line, "md ghost\r\n");
                server.write_all(b"NF\r\n").await.unwrap();
            }
        }
        let error = delete_fut.await.expect_err("deleting an absent key should fail");
        assert!(matches!(error, ClientError::KeyNotFound { .. }));

        client.close();
        driver.await.expect("driver task should not panic").ok();
    }

    #[tokio::test]
    async fn add_collision_is_key_exist() {
        let (connection, client, server) = harness();
        let driver = tokio::spawn(connection.run());
        let mut server = BufReader::new(server);

        let add_fut = client.add(b"foo", &b"v".to_vec(), TimeToLive::Indefinitely);
        tokio::pin!(add_fut);
        tokio::select! {
            result = &mut add_fut => panic!("add resolved before the fake server replied: {result:?}"),
            line = read_request_line(&mut server) => {
                assert_eq!(line, "ms foo 1 T0 ME\r\n");
                let _payload = read_payload(&mut server, 1).await;
                server.write_all(b"NS\r\n").await.unwrap();
            }
        }
        let error = add_fut.await.expect_err("add on an existing key should fail");
        assert!(matches!(error, ClientError::KeyExist { .. }));

        client.close();
        driver.await.expect("driver task should not panic").ok();
    }

    #[tokio::test]
    async fn close_terminates_the_driver_and_future_submissions() {
        let (connection, client, _server) = harness();
        let driver = tokio::spawn(connection.run());

        client.close();
        client.closed().await;
        assert_eq!(client.state(), ConnectionState::Finished);

        let error = client
            .delete(b"anything")
            .await
            .expect_err("submissions after close should fail");
        assert!(matches!(error, ClientError::ConnectionShutdown { .. }));

        driver.await.expect("driver task should not panic").ok();
    }
}
