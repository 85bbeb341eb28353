//! Wire codec for the Memcached text meta-protocol (`mg`/`ms`/`md`/`ma`).
//!
//! # Overview
//!
//! This crate owns everything that touches the bytes on the wire: encoding
//! typed [`Request`]s into command lines, and incrementally decoding
//! [`Response`]s back out of a byte stream that may arrive in arbitrarily
//! small fragments. It has no knowledge of sockets, retries, or connection
//! lifecycle — that belongs to the `client` crate, which drives a
//! [`Codec`] through a [`tokio_util::codec::Framed`].
//!
//! # Design
//!
//! The decoder is a small explicit state machine (see [`codec`]) rather than
//! a single "read a line, then parse it" function, because a `VA` response's
//! payload can straddle an arbitrary number of TCP segments. Each state only
//! advances past bytes it has fully validated; running out of input at any
//! point returns `Ok(None)` without consuming anything, so the caller can
//! feed more bytes and call `decode` again.
//!
//! # Invariants
//!
//! - [`Request::encode`] and the decoder agree on wire format: anything this
//!   crate encodes, it can also decode, and vice versa.
//! - The decoder never panics on malformed input; every failure mode is a
//!   [`DecodeError`] variant.
//! - [`buffer`]'s helpers operate on borrowed slices and never allocate,
//!   keeping the hot decode path allocation-free apart from the final value
//!   payload copy.

#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

mod buffer;
mod codec;
mod error;
mod flags;
mod request;
mod response;
mod value;

pub use codec::Codec;
pub use error::DecodeError;
pub use flags::{ArithmeticMode, Flags, StorageMode};
pub use request::{validate_key, Request};
pub use response::{Response, ReturnCode};
pub use value::Value;
