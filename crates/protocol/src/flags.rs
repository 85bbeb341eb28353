//! Flag block serialization and parsing, and the storage/arithmetic
//! mode enums the flag grammar carries.

use bytes::{BufMut, BytesMut};

use crate::buffer::{find_byte, put_ascii_u64, take_ascii_int, take_ascii_uint};
use crate::error::DecodeError;

/// `ms` storage mode, carried by the `M<letter>` flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageMode {
    /// `ME` — store only if the key does not already exist.
    Add,
    /// `MA` — append to the existing value.
    Append,
    /// `MP` — prepend to the existing value.
    Prepend,
    /// `MR` — store only if the key already exists.
    Replace,
}

impl StorageMode {
    fn letter(self) -> u8 {
        match self {
            Self::Add => b'E',
            Self::Append => b'A',
            Self::Prepend => b'P',
            Self::Replace => b'R',
        }
    }

    fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'E' => Some(Self::Add),
            b'A' => Some(Self::Append),
            b'P' => Some(Self::Prepend),
            b'R' => Some(Self::Replace),
            _ => None,
        }
    }
}

/// `ma` arithmetic mode, carried by `M<+|-> D<delta>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArithmeticMode {
    /// `M+ D<delta>` — increment by `delta`.
    Increment(u64),
    /// `M- D<delta>` — decrement by `delta`.
    Decrement(u64),
}

/// The flag block attached to a request or response line.
///
/// The same struct serves both directions: request-side fields
/// (`return_value`, `return_ttl`, `set_ttl`, `storage_mode`,
/// `arithmetic_mode`) are only ever written by the encoder, and the
/// response-only field (`ttl_remaining`) is only ever produced by the
/// decoder, since the wire token that carries it (`t<seconds>`) only appears
/// server-side.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Flags {
    /// `v` — ask the server to return the value (request-only).
    pub return_value: bool,
    /// `t` bare token — ask the server to return the TTL (request-only).
    pub return_ttl: bool,
    /// `T<n>` — set the TTL in seconds (`0` means indefinite) or, for values
    /// beyond 2,592,000, as an absolute Unix timestamp (request-only).
    pub set_ttl: Option<u64>,
    /// `M<E|A|P|R>` — storage mode for `ms` (request-only).
    pub storage_mode: Option<StorageMode>,
    /// `M<+|-> D<delta>` — arithmetic mode for `ma` (request-only).
    pub arithmetic_mode: Option<ArithmeticMode>,
    /// `t<n>` with a numeric payload — remaining TTL in seconds echoed by
    /// the server, `-1` conventionally meaning "no expiry" (response-only).
    pub ttl_remaining: Option<i64>,
}

impl Flags {
    /// Panics if `storage_mode` and `arithmetic_mode` are both set; this is
    /// a programmer error the encoder refuses to serialize.
    pub fn assert_valid(&self) {
        assert!(
            !(self.storage_mode.is_some() && self.arithmetic_mode.is_some()),
            "storage_mode and arithmetic_mode must not both be set on the same request"
        );
    }

    /// Serializes the flag block in the stable order required by the
    /// protocol: `v`, `t`, `T<value>`, `M<letter>`, `M<+/-> D<delta>`.
    ///
    /// Each present flag is preceded by a single space. Panics if
    /// `storage_mode` and `arithmetic_mode` are both set.
    pub fn encode(&self, dst: &mut BytesMut) {
        self.assert_valid();
        if self.return_value {
            dst.put_slice(b" v");
        }
        if self.return_ttl {
            dst.put_slice(b" t");
        }
        if let Some(ttl) = self.set_ttl {
            dst.put_slice(b" T");
            put_ascii_u64(dst, ttl);
        }
        if let Some(mode) = self.storage_mode {
            dst.put_slice(b" M");
            dst.put_u8(mode.letter());
        }
        if let Some(mode) = self.arithmetic_mode {
            match mode {
                ArithmeticMode::Increment(delta) => {
                    dst.put_slice(b" M+ D");
                    put_ascii_u64(dst, delta);
                }
                ArithmeticMode::Decrement(delta) => {
                    dst.put_slice(b" M- D");
                    put_ascii_u64(dst, delta);
                }
            }
        }
    }

    /// Parses a flag block from `line`, a byte slice containing everything
    /// between the return code/data length and the terminating CRLF
    /// (exclusive of the CRLF itself).
    ///
    /// Consumes whitespace between tokens; an unrecognised flag letter is a
    /// protocol error.
    pub fn parse(line: &[u8]) -> Result<Self, DecodeError> {
        let mut flags = Flags::default();
        let mut pending_sign: Option<bool> = None; // Some(true) = increment
        let mut rest = line;

        loop {
            let trimmed = skip_whitespace(rest);
            if trimmed.is_empty() {
                break;
            }
            let (letter, after_letter) = (trimmed[0], &trimmed[1..]);
            let token_end = find_byte(after_letter, b' ').unwrap_or(after_letter.len());
            let payload = &after_letter[..token_end];

            match letter {
                b'v' => {
                    if !payload.is_empty() {
                        return Err(DecodeError::Malformed(
                            "'v' flag takes no payload".to_owned(),
                        ));
                    }
                    flags.return_value = true;
                }
                b't' => {
                    if payload.is_empty() {
                        flags.return_ttl = true;
                    } else {
                        let (value, consumed) = take_ascii_int(payload)
                            .ok_or(DecodeError::ExpectedDigit(payload[0]))?;
                        if consumed != payload.len() {
                            return Err(DecodeError::Malformed(
                                "trailing garbage after 't' flag value".to_owned(),
                            ));
                        }
                        flags.ttl_remaining = Some(value);
                    }
                }
                b'T' => {
                    let (value, consumed) =
                        take_ascii_uint(payload).ok_or(DecodeError::ExpectedDigit(
                            peek_or_zero(payload),
                        ))?;
                    if consumed != payload.len() {
                        return Err(DecodeError::Malformed(
                            "trailing garbage after 'T' flag value".to_owned(),
                        ));
                    }
                    flags.set_ttl = Some(value);
                }
                b'M' => {
                    if payload.len() != 1 {
                        return Err(DecodeError::Malformed(
                            "'M' flag takes exactly one letter".to_owned(),
                        ));
                    }
                    match payload[0] {
                        b'+' => pending_sign = Some(true),
                        b'-' => pending_sign = Some(false),
                        letter => {
                            flags.storage_mode = Some(
                                StorageMode::from_letter(letter)
                                    .ok_or(DecodeError::UnknownFlag(letter))?,
                            );
                        }
                    }
                }
                b'D' => {
                    let (value, consumed) =
                        take_ascii_uint(payload).ok_or(DecodeError::ExpectedDigit(
                            peek_or_zero(payload),
                        ))?;
                    if consumed != payload.len() {
                        return Err(DecodeError::Malformed(
                            "trailing garbage after 'D' flag value".to_owned(),
                        ));
                    }
                    let is_increment = pending_sign.take().ok_or_else(|| {
                        DecodeError::Malformed(
                            "'D' flag without a preceding 'M+'/'M-' sign".to_owned(),
                        )
                    })?;
                    flags.arithmetic_mode = Some(if is_increment {
                        ArithmeticMode::Increment(value)
                    } else {
                        ArithmeticMode::Decrement(value)
                    });
                }
                other => return Err(DecodeError::UnknownFlag(other)),
            }

            rest = &after_letter[token_end..];
        }

        Ok(flags)
    }
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < data.len() && data[i] == b' ' {
        i += 1;
    }
    &data[i..]
}

fn peek_or_zero(data: &[u8]) -> u8 {
    data.first().copied().unwrap_or(0)
}
