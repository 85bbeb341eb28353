//! Async connection actor and typed command API for the Memcached text
//! meta-protocol.
//!
//! # Overview
//!
//! [`Connection::connect`] dials a server and returns a `(Connection,
//! Client)` pair: `Connection::run` is the driver loop, meant to be
//! `.await`ed or spawned on whatever runtime the caller is already using;
//! [`Client`] is the cheaply-`Clone`able handle application code calls
//! `get`/`set`/`delete`/... on. Every command round-trips through the
//! driver loop over an internal channel, so the socket only ever has one
//! writer.
//!
//! # Design
//!
//! - [`protocol`] owns wire encoding/decoding; this crate owns connection
//!   lifecycle, request/response correlation, and the typed command API
//!   built on top of it.
//! - [`Clock`] and [`Dial`] are the two seams that let tests replace real
//!   time and a real socket with deterministic substitutes.
//! - Errors are [`ClientError`], a closed taxonomy of five kinds, each
//!   (save [`ClientError::Io`]) carrying the call-site [`std::panic::Location`]
//!   of the command that raised it.
#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]

mod clock;
mod config;
mod connection;
mod dial;
mod error;
mod ttl;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use connection::{Client, Connection, ConnectionState};
pub use dial::{Dial, TcpDialer};
pub use error::{ClientError, ClientResult};
pub use ttl::{TimeToLive, MAX_RELATIVE_TTL_SECS};
