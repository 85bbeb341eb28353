//! Request encoding: turns a typed [`Request`] into the bytes of
//! exactly one meta-protocol command line.

use bytes::{BufMut, BytesMut};

use crate::buffer::put_ascii_u64;
use crate::flags::Flags;

/// A single meta-protocol request.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// `ms <key> <len>[<flags>]\r\n<payload>\r\n`
    Set {
        /// The key to store under.
        key: Vec<u8>,
        /// The raw payload to store.
        value: Vec<u8>,
        /// TTL and/or storage mode flags.
        flags: Flags,
    },
    /// `mg <key>[<flags>]\r\n` — also used for touch-only requests.
    Get {
        /// The key to fetch.
        key: Vec<u8>,
        /// Value/TTL return flags, and an optional new TTL.
        flags: Flags,
    },
    /// `md <key>\r\n`
    Delete {
        /// The key to delete.
        key: Vec<u8>,
    },
    /// `ma <key>[<flags>]\r\n`
    Arithmetic {
        /// The key to adjust.
        key: Vec<u8>,
        /// The increment/decrement mode and delta.
        flags: Flags,
    },
}

impl Request {
    /// Encodes this request to `dst`, appending exactly one command (plus,
    /// for `Set`, its payload line).
    ///
    /// # Panics
    ///
    /// Panics if the key is empty or contains whitespace/CR/LF, or if the
    /// request's flags set both `storage_mode` and `arithmetic_mode`
    /// (programmer errors per the protocol's preconditions).
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Request::Set { key, value, flags } => {
                validate_key(key);
                dst.put_slice(b"ms ");
                dst.put_slice(key);
                dst.put_u8(b' ');
                put_ascii_u64(dst, value.len() as u64);
                flags.encode(dst);
                dst.put_slice(b"\r\n");
                dst.put_slice(value);
                dst.put_slice(b"\r\n");
            }
            Request::Get { key, flags } => {
                validate_key(key);
                dst.put_slice(b"mg ");
                dst.put_slice(key);
                flags.encode(dst);
                dst.put_slice(b"\r\n");
            }
            Request::Delete { key } => {
                validate_key(key);
                dst.put_slice(b"md ");
                dst.put_slice(key);
                dst.put_slice(b"\r\n");
            }
            Request::Arithmetic { key, flags } => {
                validate_key(key);
                dst.put_slice(b"ma ");
                dst.put_slice(key);
                flags.encode(dst);
                dst.put_slice(b"\r\n");
            }
        }
    }
}

/// Validates that `key` is non-empty, ASCII, and contains no whitespace,
/// `\r`, or `\n`.
///
/// # Panics
///
/// Panics if the key violates any of the above; the meta-protocol has no
/// way to represent such a key, so this is a programmer error rather than a
/// recoverable one.
pub fn validate_key(key: &[u8]) {
    assert!(!key.is_empty(), "memcached key must not be empty");
    assert!(
        key.iter()
            .all(|&b| b.is_ascii() && !b.is_ascii_whitespace()),
        "memcached key must be ASCII with no whitespace or CR/LF"
    );
}
