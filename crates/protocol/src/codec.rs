//! The incremental response decoder and request encoder, wired up
//! as a [`tokio_util::codec`] pair so the `client` crate can drive a single
//! `Framed` socket as a `Stream<Item = Response>` + `Sink<Request>`.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::buffer::{find_byte, find_crlf, peek_u8, take_ascii_uint};
use crate::error::DecodeError;
use crate::flags::Flags;
use crate::request::Request;
use crate::response::{Response, ReturnCode};

/// Where the decoder is within a single response line/payload.
///
/// Mirrors the `ReturnCode → DataLength → Flags → Value` state table: each
/// variant only advances once its own bytes are fully available, so a
/// `decode` call that runs out of bytes mid-step leaves `src` untouched and
/// resumes from the same state on the next call.
#[derive(Debug)]
enum State {
    ReturnCode,
    DataLength(ReturnCode),
    Flags(ReturnCode, Option<u64>),
    Value(ReturnCode, u64, Flags),
}

/// Codec for the Memcached text meta-protocol.
///
/// Implements [`Decoder`] for inbound [`Response`]s and [`Encoder<Request>`]
/// for outbound [`Request`]s, so a `tokio_util::codec::Framed<TcpStream,
/// Codec>` gives the connection actor a single `Stream + Sink` to drive.
#[derive(Debug)]
pub struct Codec {
    state: State,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            state: State::ReturnCode,
        }
    }
}

impl Codec {
    /// Creates a fresh codec, positioned at the start of a response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for Codec {
    type Item = Response;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Response>, DecodeError> {
        loop {
            match &self.state {
                State::ReturnCode => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    let code = ReturnCode::parse([src[0], src[1]])?;
                    src.advance(2);
                    self.state = State::DataLength(code);
                }

                State::DataLength(code) => {
                    let code = *code;
                    if code != ReturnCode::VA {
                        self.state = State::Flags(code, None);
                        continue;
                    }
                    if src.is_empty() {
                        return Ok(None);
                    }
                    if src[0] != b' ' {
                        return Err(DecodeError::Malformed(
                            "expected a space before the VA data length".to_owned(),
                        ));
                    }
                    let after_space = &src[1..];
                    let Some(terminator) =
                        find_byte(after_space, b' ').or_else(|| find_crlf(after_space))
                    else {
                        return Ok(None);
                    };
                    let digits = &after_space[..terminator];
                    let (len, consumed) = take_ascii_uint(digits)
                        .ok_or_else(|| DecodeError::ExpectedDigit(peek_u8(digits).unwrap_or(0)))?;
                    if consumed != digits.len() {
                        return Err(DecodeError::Malformed(
                            "trailing garbage in VA data length".to_owned(),
                        ));
                    }
                    src.advance(1 + consumed);
                    self.state = State::Flags(code, Some(len));
                }

                State::Flags(code, len) => {
                    let code = *code;
                    let len = *len;
                    let Some(crlf_pos) = find_crlf(src) else {
                        return Ok(None);
                    };
                    let flags = Flags::parse(&src[..crlf_pos])?;
                    src.advance(crlf_pos + 2);
                    if code == ReturnCode::VA {
                        let len = len.expect("DataLength always sets Some(len) for VA");
                        self.state = State::Value(code, len, flags);
                    } else {
                        self.state = State::ReturnCode;
                        return Ok(Some(Response {
                            return_code: code,
                            data_length: None,
                            flags,
                            value: None,
                        }));
                    }
                }

                State::Value(code, len, flags) => {
                    let code = *code;
                    let len = *len;
                    let needed = len as usize + 2;
                    if src.len() < needed {
                        return Ok(None);
                    }
                    if &src[len as usize..needed] != b"\r\n" {
                        return Err(DecodeError::MissingCrlf);
                    }
                    let value = src[..len as usize].to_vec();
                    let flags = flags.clone();
                    src.advance(needed);
                    self.state = State::ReturnCode;
                    return Ok(Some(Response {
                        return_code: code,
                        data_length: Some(len),
                        flags,
                        value: Some(value),
                    }));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Response>, DecodeError> {
        match self.decode(src)? {
            Some(response) => Ok(Some(response)),
            None => {
                if src.is_empty() && matches!(self.state, State::ReturnCode) {
                    Ok(None)
                } else {
                    Err(DecodeError::UnexpectedEof("response"))
                }
            }
        }
    }
}

impl Encoder<Request> for Codec {
    type Error = DecodeError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), DecodeError> {
        item.encode(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(codec: &mut Codec, buf: &mut BytesMut, bytes: &[u8]) -> Option<Response> {
        buf.extend_from_slice(bytes);
        codec.decode(buf).expect("decode should not error")
    }

    #[test]
    fn decodes_hd_with_no_payload() {
        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        let response = feed(&mut codec, &mut buf, b"HD\r\n").unwrap();
        assert_eq!(response.return_code, ReturnCode::HD);
        assert_eq!(response.value, None);
    }

    #[test]
    fn decodes_va_with_payload() {
        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        let response = feed(&mut codec, &mut buf, b"VA 3\r\nbar\r\n").unwrap();
        assert_eq!(response.return_code, ReturnCode::VA);
        assert_eq!(response.data_length, Some(3));
        assert_eq!(response.value.as_deref(), Some(&b"bar"[..]));
    }

    #[test]
    fn decodes_va_with_echoed_ttl_flag() {
        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        let response = feed(&mut codec, &mut buf, b"VA 3 t3600\r\nbar\r\n").unwrap();
        assert_eq!(response.flags.ttl_remaining, Some(3600));
    }

    #[test]
    fn streaming_byte_by_byte_yields_need_more_until_complete() {
        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        let full = b"VA 2\r\nhi\r\n";
        for &byte in &full[..full.len() - 1] {
            assert!(feed(&mut codec, &mut buf, &[byte]).is_none());
        }
        let response = feed(&mut codec, &mut buf, &full[full.len() - 1..]).unwrap();
        assert_eq!(response.return_code, ReturnCode::VA);
        assert_eq!(response.value.as_deref(), Some(&b"hi"[..]));
    }

    #[test]
    fn decodes_two_responses_back_to_back() {
        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"HD\r\nNF\r\n");
        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.return_code, ReturnCode::HD);
        assert_eq!(second.return_code, ReturnCode::NF);
    }

    #[test]
    fn malformed_return_code_is_an_error() {
        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"ZZ\r\n");
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedReturnCode(_)));
    }

    #[test]
    fn missing_crlf_after_value_is_an_error() {
        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"VA 3\r\nbarXX");
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, DecodeError::MissingCrlf));
    }

    #[test]
    fn every_prefix_split_of_a_response_yields_need_more_bytes_until_the_last() {
        let full: &[u8] = b"VA 5 t-1\r\nhello\r\n";
        for split in 1..full.len() {
            let mut codec = Codec::new();
            let mut buf = BytesMut::new();
            let first = feed(&mut codec, &mut buf, &full[..split]);
            assert!(first.is_none(), "split at {split} should need more bytes");
            let second = feed(&mut codec, &mut buf, &full[split..]);
            assert!(second.is_some(), "split at {split} should complete");
        }
    }

    #[test]
    fn encoder_round_trips_through_request_encode() {
        use crate::flags::Flags;

        let mut codec = Codec::new();
        let mut buf = BytesMut::new();
        let req = Request::Delete {
            key: b"foo".to_vec(),
        };
        tokio_util::codec::Encoder::encode(&mut codec, req, &mut buf).unwrap();
        assert_eq!(&buf[..], b"md foo\r\n");

        let mut buf2 = BytesMut::new();
        let req2 = Request::Get {
            key: b"foo".to_vec(),
            flags: Flags {
                return_value: true,
                ..Flags::default()
            },
        };
        tokio_util::codec::Encoder::encode(&mut codec, req2, &mut buf2).unwrap();
        assert_eq!(&buf2[..], b"mg foo v\r\n");
    }
}
