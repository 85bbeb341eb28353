//! Wire-level decode errors.
//!
//! These are the errors the response decoder can raise; they are a
//! strict subset of the user-facing error taxonomy. The `client` crate wraps
//! every variant here into its own `ProtocolError` kind when a decode fails
//! on a live connection.

use std::io;

use thiserror::Error;

/// Errors raised while decoding a response line from the wire.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The two leading bytes of a response line were not a recognised
    /// return code.
    #[error("malformed return code {0:?}")]
    MalformedReturnCode([u8; 2]),

    /// A digit was expected (for a data length or a numeric flag payload)
    /// but something else was found.
    #[error("expected an ASCII digit, found byte {0:#04x}")]
    ExpectedDigit(u8),

    /// A flag token used a letter this decoder does not recognise.
    #[error("unknown flag byte {0:?}")]
    UnknownFlag(u8),

    /// A flag token, data length, or other line component was malformed in
    /// a way more specific than "unknown letter" (e.g. an arithmetic delta
    /// with no preceding sign flag, or a data length with no leading
    /// space).
    #[error("malformed response line: {0}")]
    Malformed(String),

    /// A required CRLF terminator was missing where the grammar mandates
    /// one to be present in the bytes already scanned.
    #[error("missing CRLF terminator")]
    MissingCrlf,

    /// The underlying stream ended while the decoder was mid-response.
    #[error("unexpected end of stream while decoding {0}")]
    UnexpectedEof(&'static str),

    /// An I/O error surfaced by the framing layer underneath the decoder.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
